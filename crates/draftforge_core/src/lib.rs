pub mod domain;
pub mod generation;
pub mod ports;
pub mod prompt;
pub mod render;

pub use domain::{
    AuthSession, Feedback, OutputKind, Project, Section, UnknownOutputKind, User, UserCredentials,
};
pub use ports::{DatabaseService, PortError, PortResult, TextGenerationService};
pub use render::{RenderError, RenderedDocument};
