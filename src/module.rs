//! Fieldcam component modules.

pub mod cloud; // Cloud module: Drive session and file transfer.
pub mod define; // Definition module: Contains definitions and constants used throughout the project.
pub mod device; // Device module: Manages hardware devices and interactions.
pub mod mission; // Mission module: Sequential orchestration of a scheduled run.
pub mod util; // Utility module: Provides various utility functions and helpers.
