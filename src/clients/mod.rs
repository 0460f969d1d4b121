pub mod identity;
pub mod media;

pub use identity::{IdentityClient, VerifiedIdentity};
pub use media::{MediaAsset, MediaClient};
