pub mod google;
pub mod identity;
pub mod storage;

pub use google::{GoogleClaims, GoogleJwksVerifier, GoogleTokenVerifier};
pub use identity::{GoTrueClient, Identity, IdentityProvider, NewIdentity, OtpType, ProviderSession};
pub use storage::{ObjectStore, StorageClient};
