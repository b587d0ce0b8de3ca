pub mod auth;
pub mod candidate;
pub mod config;
pub mod envelope;
pub mod voting;

use serde::{Deserialize, Deserializer};

/// Backend ids are database serials.
pub type CandidateId = i64;

/// The backend sends `null` for several fields it otherwise documents as present.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Where a view wants the user to go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    Profile,
    Vote,
    Results,
}
