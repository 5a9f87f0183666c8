//! Core components for the entity system

use crate::meta::{MetaData, SharedStore, SyncedMetaData};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// World-stable identity of an entity
///
/// Unlike `hecs::Entity`, this id is allocated by the [`World`](super::World)
/// and is the same on every peer that mirrors the entity, so it is what
/// replication messages and scripts refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Raw numeric id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Kind of base object an entity represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseObjectType {
    Player,
    Vehicle,
    Ped,
    Object,
    VoiceChannel,
}

impl BaseObjectType {
    pub const ALL: [BaseObjectType; 5] = [
        BaseObjectType::Player,
        BaseObjectType::Vehicle,
        BaseObjectType::Ped,
        BaseObjectType::Object,
        BaseObjectType::VoiceChannel,
    ];

    /// Constant name in the script enum namespace
    pub fn constant_name(self) -> &'static str {
        match self {
            BaseObjectType::Player => "PLAYER",
            BaseObjectType::Vehicle => "VEHICLE",
            BaseObjectType::Ped => "PED",
            BaseObjectType::Object => "OBJECT",
            BaseObjectType::VoiceChannel => "VOICE_CHANNEL",
        }
    }

    /// Name used by scripts when asking the factory for a new entity
    pub fn as_str(self) -> &'static str {
        match self {
            BaseObjectType::Player => "player",
            BaseObjectType::Vehicle => "vehicle",
            BaseObjectType::Ped => "ped",
            BaseObjectType::Object => "object",
            BaseObjectType::VoiceChannel => "voice_channel",
        }
    }
}

impl FromStr for BaseObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "player" => Ok(BaseObjectType::Player),
            "vehicle" => Ok(BaseObjectType::Vehicle),
            "ped" => Ok(BaseObjectType::Ped),
            "object" => Ok(BaseObjectType::Object),
            "voice_channel" | "voicechannel" => Ok(BaseObjectType::VoiceChannel),
            other => Err(format!("Unknown base object type: {other}")),
        }
    }
}

/// Name component for entities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    /// Create a new name component
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Local-only metadata attached to an entity
#[derive(Clone)]
pub struct Meta(pub SharedStore<MetaData>);

/// Replicated metadata attached to an entity
#[derive(Clone)]
pub struct SyncedMeta(pub SharedStore<SyncedMetaData>);
