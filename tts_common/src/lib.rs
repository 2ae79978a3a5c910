mod money;

pub mod op;

mod helpers;

pub use helpers::parse_boolean_flag;
pub use money::{Money, MoneyConversionError, RM_CURRENCY_CODE, RM_CURRENCY_CODE_LOWER};
