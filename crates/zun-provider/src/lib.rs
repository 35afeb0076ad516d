//! A kubelet backend provider that serves pod lookups from OpenStack Zun.
//!
//! Zun runs groups of containers as *capsules*. This crate translates an
//! observed capsule into the Kubernetes pod object a control plane expects:
//! the [`status`] module classifies Zun's two status vocabularies into pod
//! phases and container lifecycle states, and the [`pod`] module composes a
//! whole capsule into a [`Pod`]. The [`provider`] module exposes both behind
//! the [`Provider`] trait, together with static node capacity reporting.
//!
//! Translation is a pure function of the fetched capsule: no state is kept
//! between lookups and concurrent lookups do not interact.

#![warn(missing_docs)]

pub mod config;
pub mod pod;
pub mod provider;
pub mod status;

#[doc(inline)]
pub use pod::Pod;
#[doc(inline)]
pub use provider::{Provider, ProviderError, ZunProvider};
