mod amount;
mod secret;

pub use amount::{Amount, AmountConversionError, Ticker};
pub use secret::Secret;
