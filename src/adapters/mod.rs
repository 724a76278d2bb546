//! Adapters — concrete implementations of the host port traits.
//!
//! | Adapter    | Implements    | Connects to                  |
//! |------------|---------------|------------------------------|
//! | `bus`      | CanSend       | In-process loopback queue    |
//! | `log_sink` | EventSink     | `log` facade / memory        |
//! | `nvm`      | StoragePort   | In-memory key-value store    |

pub mod bus;
pub mod log_sink;
pub mod nvm;
