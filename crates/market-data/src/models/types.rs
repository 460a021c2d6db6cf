use std::borrow::Cow;

/// Source identifier - static constants such as "BOC" or "UNIONPAY"
pub type SourceId = Cow<'static, str>;

/// Currency code (ISO 4217) - mostly static
pub type Currency = Cow<'static, str>;
