//! Core types for the lifecycle kernel.

pub mod id;
pub mod time;
pub mod component;
pub mod concept;
pub mod category;
pub mod reason;

pub use id::{SctId, ComponentId, ComponentIdError};
pub use time::{EffectiveTime, EffectiveTimeError, changed_since};
pub use component::{
    Component, ComponentType, ComponentDetail, CharacteristicView, UnknownComponentType, IS_A,
};
pub use concept::{Concept, DefinitionStatus, ROOT_CONCEPT};
pub use category::LifecycleCategory;
pub use reason::InactivationReason;
