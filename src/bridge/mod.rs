// Extension bridge: the capability surface extension code talks to.
// One bridge per window; collaborators are injected, never implemented here.

pub mod api;
pub mod collaborators;
pub mod frames;
pub mod snapshot;

pub use api::{
    channels, BadgeColorDetails, BadgeTextDetails, CreateProperties, ExtensionBridge,
    GetAllFramesDetails, GetFrameDetails, IconDetails, InjectDetails, QueryInfo, ReloadProperties,
    UpdateProperties,
};
pub use collaborators::{MessageTransport, UiDelegate};
pub use snapshot::TabSnapshot;
