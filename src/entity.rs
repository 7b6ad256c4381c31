//! Content entity categories and identity classification
//!
//! Every content item belongs to an entity category which fixes where it
//! lives in a pack (`Integrations/`, `Playbooks/`, ...) and whether it is a
//! directory package or a single file. This module holds the category table,
//! the server type tags, and the classifier that extracts an item's identity
//! from its parsed descriptor.

use std::fmt;

use crate::content::{ContentData, FileFormat};

/// Content entity category, named after its pack directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentEntity {
    Integrations,
    Scripts,
    Playbooks,
    TestPlaybooks,
    BetaIntegrations,
    Reports,
    Dashboards,
    Widgets,
    IncidentFields,
    IndicatorFields,
    IncidentTypes,
    IndicatorTypes,
    Layouts,
    Classifiers,
    Connections,
}

impl ContentEntity {
    /// Every category, in pack listing order.
    pub const ALL: [ContentEntity; 15] = [
        ContentEntity::Integrations,
        ContentEntity::Scripts,
        ContentEntity::Playbooks,
        ContentEntity::TestPlaybooks,
        ContentEntity::BetaIntegrations,
        ContentEntity::Reports,
        ContentEntity::Dashboards,
        ContentEntity::Widgets,
        ContentEntity::IncidentFields,
        ContentEntity::IndicatorFields,
        ContentEntity::IncidentTypes,
        ContentEntity::IndicatorTypes,
        ContentEntity::Layouts,
        ContentEntity::Classifiers,
        ContentEntity::Connections,
    ];

    /// Directory name of the category inside a pack.
    pub fn dir_name(self) -> &'static str {
        match self {
            ContentEntity::Integrations => "Integrations",
            ContentEntity::Scripts => "Scripts",
            ContentEntity::Playbooks => "Playbooks",
            ContentEntity::TestPlaybooks => "TestPlaybooks",
            ContentEntity::BetaIntegrations => "Beta_Integrations",
            ContentEntity::Reports => "Reports",
            ContentEntity::Dashboards => "Dashboards",
            ContentEntity::Widgets => "Widgets",
            ContentEntity::IncidentFields => "IncidentFields",
            ContentEntity::IndicatorFields => "IndicatorFields",
            ContentEntity::IncidentTypes => "IncidentTypes",
            ContentEntity::IndicatorTypes => "IndicatorTypes",
            ContentEntity::Layouts => "Layouts",
            ContentEntity::Classifiers => "Classifiers",
            ContentEntity::Connections => "Connections",
        }
    }

    /// Category for a pack directory name.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|entity| entity.dir_name() == name)
    }

    /// Category used for indexing.
    ///
    /// The server bundle names test playbooks like playbooks and beta
    /// integrations like integrations, so both are folded onto the regular
    /// category. A test playbook and a playbook sharing a display name
    /// therefore collide.
    pub fn indexed(self) -> Self {
        match self {
            ContentEntity::TestPlaybooks => ContentEntity::Playbooks,
            ContentEntity::BetaIntegrations => ContentEntity::Integrations,
            other => other,
        }
    }

    /// Whether instances are directory packages with a main descriptor.
    pub fn is_multi_file(self) -> bool {
        matches!(
            self.indexed(),
            ContentEntity::Integrations | ContentEntity::Scripts
        )
    }

    /// Format of the file that carries an instance's identity.
    pub fn descriptor_format(self) -> FileFormat {
        match self.indexed() {
            ContentEntity::Integrations | ContentEntity::Scripts | ContentEntity::Playbooks => {
                FileFormat::Yml
            }
            _ => FileFormat::Json,
        }
    }
}

impl fmt::Display for ContentEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Content type tag the server declares for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Integration,
    Script,
    Playbook,
    Report,
    Dashboard,
    Widget,
    IncidentField,
    IndicatorField,
    IncidentType,
    Reputation,
    Layout,
    Classifier,
    Connection,
}

impl ContentKind {
    /// Type tag as used by the server.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Integration => "integration",
            ContentKind::Script => "script",
            ContentKind::Playbook => "playbook",
            ContentKind::Report => "report",
            ContentKind::Dashboard => "dashboard",
            ContentKind::Widget => "widget",
            ContentKind::IncidentField => "incidentfield",
            ContentKind::IndicatorField => "indicatorfield",
            ContentKind::IncidentType => "incidenttype",
            ContentKind::Reputation => "reputation",
            ContentKind::Layout => "layout",
            ContentKind::Classifier => "classifier",
            ContentKind::Connection => "canvas-context-connections",
        }
    }

    /// Category this type is stored under.
    pub fn entity(self) -> ContentEntity {
        match self {
            ContentKind::Integration => ContentEntity::Integrations,
            ContentKind::Script => ContentEntity::Scripts,
            ContentKind::Playbook => ContentEntity::Playbooks,
            ContentKind::Report => ContentEntity::Reports,
            ContentKind::Dashboard => ContentEntity::Dashboards,
            ContentKind::Widget => ContentEntity::Widgets,
            ContentKind::IncidentField => ContentEntity::IncidentFields,
            ContentKind::IndicatorField => ContentEntity::IndicatorFields,
            ContentKind::IncidentType => ContentEntity::IncidentTypes,
            ContentKind::Reputation => ContentEntity::IndicatorTypes,
            ContentKind::Layout => ContentEntity::Layouts,
            ContentKind::Classifier => ContentEntity::Classifiers,
            ContentKind::Connection => ContentEntity::Connections,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical identity of a content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: String,
    pub name: String,
}

/// Extract the identity of a content item from its parsed descriptor.
///
/// Returns `None` unless both id and name are present and non-empty.
pub fn classify(data: &ContentData, entity: ContentEntity) -> Option<Identity> {
    let (id, name) = match entity.indexed() {
        ContentEntity::Integrations | ContentEntity::Scripts => (
            data.string_at(&["commonfields", "id"]),
            data.string_at(&["name"]),
        ),
        ContentEntity::Layouts => (
            data.string_at(&["typeId"]).or_else(|| data.string_at(&["id"])),
            data.string_at(&["typeId"]).or_else(|| data.string_at(&["name"])),
        ),
        _ => (data.string_at(&["id"]), data.string_at(&["name"])),
    };
    Some(Identity { id: id?, name: name? })
}

/// Determine the content type declared by a parsed file.
///
/// Returns `None` for anything that is not recognizable content, such as
/// readme or changelog files.
pub fn detect_kind(format: FileFormat, data: &ContentData) -> Option<ContentKind> {
    if !data.is_mapping() {
        return None;
    }
    let has = |key: &str| data.has_key(key);

    match format {
        FileFormat::Yml => {
            if has("category") {
                Some(ContentKind::Integration)
            } else if has("script") {
                Some(ContentKind::Script)
            } else if has("tasks") {
                Some(ContentKind::Playbook)
            } else {
                None
            }
        }
        FileFormat::Json => {
            if has("widgetType") {
                Some(ContentKind::Widget)
            } else if has("orientation") {
                Some(ContentKind::Report)
            } else if has("preProcessingScript") {
                Some(ContentKind::IncidentType)
            } else if has("regex") {
                Some(ContentKind::Reputation)
            } else if has("mapping")
                || has("unclassifiedCases")
                || has("keyTypeMap")
                || has("transformer")
            {
                Some(ContentKind::Classifier)
            } else if has("layout") || has("kind") {
                if has("kind") || has("typeId") {
                    Some(ContentKind::Layout)
                } else {
                    Some(ContentKind::Dashboard)
                }
            } else if has("canvasContextConnections") {
                Some(ContentKind::Connection)
            } else {
                let id = data.string_at(&["id"])?.to_lowercase();
                if id.starts_with("incident") {
                    Some(ContentKind::IncidentField)
                } else if id.starts_with("indicator") {
                    Some(ContentKind::IndicatorField)
                } else {
                    None
                }
            }
        }
    }
}

/// Determine the category of a standalone fetched file.
pub fn detect_category(format: FileFormat, data: &ContentData) -> Option<ContentEntity> {
    detect_kind(format, data).map(ContentKind::entity)
}
