//! purerdm-http - HTTP clients for the Pure and RDM REST APIs.

mod pacing;
mod pure;
mod rdm;

pub use pacing::{Pacer, Pacing};
pub use pure::PureClient;
pub use rdm::RdmClient;

use purerdm_core::error::{Error, TransportError};

/// Map a reqwest failure onto the shared transport error.
pub(crate) fn map_transport(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}
