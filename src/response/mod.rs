pub mod composer;
pub mod format;
pub mod locale;
pub mod payload;

pub use composer::{compose, Classifications};
pub use format::NumberFormat;
pub use locale::{Catalog, Localizer};
pub use payload::{Reply, ReplyPayload};
