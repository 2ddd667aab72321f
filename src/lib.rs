//! # Raidionics model catalog
//!
//! Non-interactive core of the model selection plugin:
//!
//! - `manifest`: reads per-model manifest files into [`manifest::ModelDescriptor`]s
//! - `inventory`: asks the container runtime which image digests are cached
//! - `catalog`: reconciles manifests with the inventory and serves task views and search
//! - `selection`: rule tables mapping available clinical inputs to a model variant
//! - `backend`: writes the configuration file consumed by the processing backend
//! - `cloud`: remote model listing and atomic installation of downloaded manifests
//! - `config`: layered settings passed explicitly to each component

pub mod backend;
pub mod catalog;
pub mod cloud;
pub mod config;
pub mod inventory;
pub mod manifest;
pub mod selection;
