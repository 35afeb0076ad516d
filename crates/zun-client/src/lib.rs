//! A client for the OpenStack Zun container service, covering the small
//! surface a kubelet provider needs: authenticate against Keystone, then
//! fetch capsules by name.
#![cfg_attr(not(test), deny(missing_docs))]

pub mod client;
pub mod errors;
pub mod models;

#[doc(inline)]
pub use client::{AuthOptions, Client};
#[doc(inline)]
pub use errors::ZunError;
#[doc(inline)]
pub use models::{Address, Capsule, Container};
