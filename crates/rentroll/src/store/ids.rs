use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer key assigned by a [`Table`](super::Table).
pub trait RecordId: Copy + Ord + fmt::Debug + fmt::Display + From<u64> + Into<u64> {}

macro_rules! record_ids {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl From<u64> for $name {
                fn from(value: u64) -> Self {
                    Self(value)
                }
            }

            impl From<$name> for u64 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl RecordId for $name {}
        )+
    };
}

record_ids! {
    OwnerId,
    PropertyId,
    TenantId,
    GuarantorId,
    LeaseId,
    ChargeId,
    RentId,
    PaymentId,
    DocumentId,
    EmailConfigId,
    EmailTemplateId,
}
