mod header;
mod record;

pub use header::{FieldDef, FieldType, Header};
pub use record::{GenotypeValue, InfoValue, Variant};
