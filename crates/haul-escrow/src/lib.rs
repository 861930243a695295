//! # haul-escrow: Escrow Payment Orchestration
//!
//! Holds, charges, refunds, and carrier payouts, modelled as a two-phase
//! commit against an external payment gateway and kept consistent with
//! the load lifecycle. The [`gateway::PaymentGateway`] trait is the seam
//! to the real processor; [`EscrowOrchestrator`] owns the invoice and
//! payout rows and guarantees no step double-moves funds.

pub mod config;
pub mod error;
pub mod gateway;
pub mod orchestrator;

pub use config::EscrowConfig;
pub use error::EscrowError;
pub use gateway::{GatewayError, GatewayMetadata, GatewayRef, PaymentGateway};
pub use orchestrator::EscrowOrchestrator;
