//! # ProtoGraph RPC
//!
//! Remote call boundary between the gateway and the domain services.
//!
//! ## Structure
//!
//! - `protocol` - frame layout, method names and wire errors
//! - `server` - TCP server dispatching frames to an [`RpcHandler`]
//! - `client` - multiplexed TCP client
//! - `api` - service traits consumed by the gateway
//! - `account` / `catalog` / `order` - typed clients and handlers per service

pub mod account;
pub mod api;
pub mod catalog;
pub mod client;
pub mod dto;
pub mod order;
pub mod protocol;
pub mod server;

pub use account::{AccountClient, AccountHandler};
pub use api::{AccountApi, CatalogApi, Closeable, OrderApi};
pub use catalog::{CatalogClient, CatalogHandler};
pub use client::RpcClient;
pub use dto::{AccountDto, OrderDto, OrderedProductDto, ProductDto};
pub use order::{OrderClient, OrderHandler};
pub use server::{ConnectionTracker, RpcHandler, RpcServer};
