pub mod call;
pub mod client;
pub mod package;
pub mod slug;

pub use call::{CallCost, CallQuery, CallRecord};
pub use client::{
    BusinessType, ClientProfile, ClientRecord, Faq, ProvisioningState, ProvisioningUpdate,
};
pub use package::MinutePackage;
pub use slug::{slugify, ClientSlug};
