//! Flight identity and status
//!
//! A flight is identified by the airline operating it, its flight code and
//! its scheduled departure timestamp (Unix seconds). The same code may be
//! flown on many days, so the timestamp is part of the identity.

use serde::{Deserialize, Serialize};

use crate::error::SuretyError;
use crate::types::account::AccountId;

/// Composite flight identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    /// Operating airline
    pub airline: AccountId,
    /// Flight code, e.g. "ND1309"
    pub code: String,
    /// Scheduled departure (Unix seconds)
    pub departure: i64,
}

impl FlightKey {
    pub fn new(airline: AccountId, code: impl Into<String>, departure: i64) -> Self {
        Self {
            airline,
            code: code.into(),
            departure,
        }
    }

    /// Stable 32-byte digest of the composite key
    ///
    /// Fields are length-prefixed so that ("ab", "c") and ("a", "bc") never collide.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        let airline = self.airline.as_str().as_bytes();
        hasher.update(&(airline.len() as u64).to_le_bytes());
        hasher.update(airline);
        hasher.update(&(self.code.len() as u64).to_le_bytes());
        hasher.update(self.code.as_bytes());
        hasher.update(&self.departure.to_le_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Hex rendering of [`FlightKey::digest`] for external collaborators
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

impl std::fmt::Display for FlightKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.airline, self.code, self.departure)
    }
}

/// Flight status as reported by oracles
///
/// Discriminants are the wire codes oracles submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FlightStatus {
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::Unknown,
        FlightStatus::OnTime,
        FlightStatus::LateAirline,
        FlightStatus::LateWeather,
        FlightStatus::LateTechnical,
        FlightStatus::LateOther,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self, SuretyError> {
        match code {
            0 => Ok(FlightStatus::Unknown),
            10 => Ok(FlightStatus::OnTime),
            20 => Ok(FlightStatus::LateAirline),
            30 => Ok(FlightStatus::LateWeather),
            40 => Ok(FlightStatus::LateTechnical),
            50 => Ok(FlightStatus::LateOther),
            other => Err(SuretyError::InvalidStatusCode(other)),
        }
    }

    /// Only delays caused by the airline pay out
    #[inline]
    pub fn is_payable(self) -> bool {
        self == FlightStatus::LateAirline
    }
}

impl TryFrom<u8> for FlightStatus {
    type Error = SuretyError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightStatus::Unknown => write!(f, "unknown"),
            FlightStatus::OnTime => write!(f, "on time"),
            FlightStatus::LateAirline => write!(f, "late due to airline"),
            FlightStatus::LateWeather => write!(f, "late due to weather"),
            FlightStatus::LateTechnical => write!(f, "late due to technical"),
            FlightStatus::LateOther => write!(f, "late due to other"),
        }
    }
}
