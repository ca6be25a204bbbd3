use chrono::Utc;
use pagelift_common::ElementIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Runtime-observed snapshot of a selected element, produced by the
/// overlay and consumed by the host for display. Read-only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementData {
    pub tag_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    /// Sampled subset of resolved visual style properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, String>,
}

/// Sparse patch for an element. Carries no identity of its own; it is
/// always paired with one in the enclosing message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl ElementUpdates {
    pub fn is_empty(&self) -> bool {
        self.class_name.is_none()
            && self.text_content.is_none()
            && self.src.is_none()
            && self.alt.is_none()
            && self.href.is_none()
    }

    /// Overlay `other` onto `self`, keeping `self`'s fields where `other`
    /// is silent.
    pub fn merge(&mut self, other: &ElementUpdates) {
        if other.class_name.is_some() {
            self.class_name = other.class_name.clone();
        }
        if other.text_content.is_some() {
            self.text_content = other.text_content.clone();
        }
        if other.src.is_some() {
            self.src = other.src.clone();
        }
        if other.alt.is_some() {
            self.alt = other.alt.clone();
        }
        if other.href.is_some() {
            self.href = other.href.clone();
        }
    }
}

/// One entry in the bulk elements-state response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    pub id: ElementIdentity,
    pub attributes: BTreeMap<String, String>,
}

/// Light/dark CSS variable maps pushed into the preview.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThemeVariables {
    pub light: BTreeMap<String, String>,
    pub dark: BTreeMap<String, String>,
}

/// Closed union of protocol messages. Exactly one variant per message;
/// adding a kind is a compile-time-checked change at every match site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DesignModeMessage {
    /// Host → Preview
    SetDesignMode { enabled: bool },

    /// Preview → Host
    ElementSelected {
        id: ElementIdentity,
        element: ElementData,
    },

    /// Host → Preview
    DeselectElement { id: ElementIdentity },

    /// Host → Preview; applied live to the DOM, no source text involved
    UpdateElement {
        id: ElementIdentity,
        updates: ElementUpdates,
    },

    /// Host → Preview
    RequestElementsState,

    /// Preview → Host
    ElementsState { elements: Vec<ElementState> },

    /// Host → Preview
    PushThemeVariables { theme: ThemeVariables },
}

/// Wire envelope: the message plus a millisecond timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub timestamp: i64,

    #[serde(flatten)]
    pub message: DesignModeMessage,
}

impl Envelope {
    pub fn new(message: DesignModeMessage) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            message,
        }
    }
}
