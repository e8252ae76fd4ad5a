//! Radio command protocol.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Protocol Stack                         │
//! │                                                            │
//! │  ┌───────────┐   ┌──────────┐   ┌───────────────────────┐  │
//! │  │ RadioPort │──▶│  Frames  │──▶│  Engine (dispatcher)  │  │
//! │  │ (listen)  │   │ (decode) │   │  → Store / Clock      │  │
//! │  └───────────┘   └──────────┘   └───────────┬───────────┘  │
//! │        ▲                                    │              │
//! │        │          ┌─────────────────────────┘              │
//! │        │          ▼                                        │
//! │  ┌───────────┐   ┌───────────┐                             │
//! │  │ RadioPort │◀──│ TxSession │   (paced reply frames)      │
//! │  │ (transmit)│   │  (guard)  │                             │
//! │  └───────────┘   └───────────┘                             │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod engine;
pub mod frames;

pub use engine::{EngineStats, Exchange, INTERVAL_KEY, ProtocolEngine, TxSession};
pub use frames::{DataResponse, FileEntry, FrameError, Opcode, Request};
