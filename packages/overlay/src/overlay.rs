use crate::dom::{NodePath, PreviewDocument, PreviewElement, SOURCE_ATTR};
use pagelift_common::ElementIdentity;
use pagelift_protocol::{
    DesignModeMessage, ElementData, ElementState, ElementUpdates, Endpoint,
};
use tracing::debug;

/// Overlay interaction state.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayState {
    Inactive,
    Active {
        hovered: Option<ElementIdentity>,
        selected: Option<ElementIdentity>,
    },
}

/// The overlay session, scoped to one preview lifetime. Torn down and
/// recreated on reload; holds no ambient global state.
pub struct Overlay {
    document: PreviewDocument,
    endpoint: Endpoint,
    state: OverlayState,
}

impl Overlay {
    pub fn new(document: PreviewDocument, endpoint: Endpoint) -> Self {
        Self {
            document,
            endpoint,
            state: OverlayState::Inactive,
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn document(&self) -> &PreviewDocument {
        &self.document
    }

    /// Identity currently highlighted by hover tracking, if any.
    pub fn highlighted(&self) -> Option<&ElementIdentity> {
        match &self.state {
            OverlayState::Active { hovered, .. } => hovered.as_ref(),
            OverlayState::Inactive => None,
        }
    }

    pub fn selected(&self) -> Option<&ElementIdentity> {
        match &self.state {
            OverlayState::Active { selected, .. } => selected.as_ref(),
            OverlayState::Inactive => None,
        }
    }

    /// Drain and handle every message already queued on the channel.
    pub fn process_pending(&mut self) {
        while let Some(message) = self.endpoint.try_recv() {
            self.handle_message(message);
        }
    }

    /// Handle messages until the host endpoint closes.
    pub async fn run(&mut self) {
        while let Some(message) = self.endpoint.recv().await {
            self.handle_message(message);
        }
    }

    pub fn handle_message(&mut self, message: DesignModeMessage) {
        match message {
            DesignModeMessage::SetDesignMode { enabled } => {
                self.state = if enabled {
                    OverlayState::Active {
                        hovered: None,
                        selected: None,
                    }
                } else {
                    OverlayState::Inactive
                };
            }

            DesignModeMessage::UpdateElement { id, updates } => {
                let OverlayState::Active {
                    selected: Some(selected),
                    ..
                } = &self.state
                else {
                    return;
                };

                if *selected != id {
                    debug!(id = %id, "live update for non-selected element ignored");
                    return;
                }

                if let Some(element) = self.document.find_by_identity_mut(&id) {
                    apply_updates(element, &updates);
                }
            }

            DesignModeMessage::DeselectElement { id } => {
                if let OverlayState::Active { selected, .. } = &mut self.state {
                    if selected.as_ref() == Some(&id) {
                        *selected = None;
                    }
                }
            }

            DesignModeMessage::RequestElementsState => {
                if matches!(self.state, OverlayState::Inactive) {
                    return;
                }
                let elements = self.collect_elements_state();
                self.endpoint
                    .send(DesignModeMessage::ElementsState { elements });
            }

            DesignModeMessage::PushThemeVariables { theme } => {
                self.document.theme = theme;
            }

            // Preview → Host messages have no meaning here
            other => debug!(?other, "ignoring host-bound message"),
        }
    }

    /// Pointer moved over the node at `path`. Highlights only; no message
    /// is emitted for hover.
    pub fn pointer_moved(&mut self, path: &NodePath) {
        let OverlayState::Active { .. } = self.state else {
            return;
        };

        let identity = self.document.resolve_identity(path);
        if let OverlayState::Active { hovered, .. } = &mut self.state {
            *hovered = identity;
        }
    }

    /// Click on the node at `path`: emits a selection message carrying the
    /// resolved identity and an observed snapshot. Clicking a different
    /// element re-selects implicitly.
    pub fn clicked(&mut self, path: &NodePath) {
        let OverlayState::Active { .. } = self.state else {
            return;
        };

        let Some(identity) = self.document.resolve_identity(path) else {
            return;
        };
        let Some(element) = self
            .document
            .find_by_identity_mut(&identity)
            .map(|e| snapshot(e))
        else {
            return;
        };

        self.endpoint.send(DesignModeMessage::ElementSelected {
            id: identity.clone(),
            element,
        });

        if let OverlayState::Active { selected, .. } = &mut self.state {
            *selected = Some(identity);
        }
    }

    fn collect_elements_state(&self) -> Vec<ElementState> {
        self.document
            .instrumented_elements()
            .into_iter()
            .filter_map(|element| {
                let id = element.identity()?;
                let mut attributes = element.attributes.clone();
                attributes.remove(SOURCE_ATTR);
                if let Some(text) = &element.text {
                    attributes.insert("textContent".to_string(), text.clone());
                }
                Some(ElementState { id, attributes })
            })
            .collect()
    }
}

/// Observed snapshot of a rendered element.
fn snapshot(element: &PreviewElement) -> ElementData {
    ElementData {
        tag_name: element.tag.clone(),
        class_name: element.attributes.get("class").cloned(),
        text_content: element.text.clone(),
        src: element.attributes.get("src").cloned(),
        alt: element.attributes.get("alt").cloned(),
        href: element.attributes.get("href").cloned(),
        styles: element.styles.clone(),
    }
}

/// Apply a live patch directly to the rendered element. No source text is
/// involved; this exists for instant feedback only.
fn apply_updates(element: &mut PreviewElement, updates: &ElementUpdates) {
    if let Some(class_name) = &updates.class_name {
        element
            .attributes
            .insert("class".to_string(), class_name.clone());
    }
    if let Some(text) = &updates.text_content {
        element.text = Some(text.clone());
    }
    if let Some(src) = &updates.src {
        element.attributes.insert("src".to_string(), src.clone());
    }
    if let Some(alt) = &updates.alt {
        element.attributes.insert("alt".to_string(), alt.clone());
    }
    if let Some(href) = &updates.href {
        element.attributes.insert("href".to_string(), href.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelift_protocol::channel_pair;

    fn hero_document() -> PreviewDocument {
        PreviewDocument::new(vec![PreviewElement::new("section")
            .with_attr(SOURCE_ATTR, "/src/hero.tsx:1:0")
            .with_child(
                PreviewElement::new("h1")
                    .with_attr(SOURCE_ATTR, "/src/hero.tsx:2:2")
                    .with_attr("class", "text-lg")
                    .with_text("Hello")
                    .with_style("font-size", "18px"),
            )])
    }

    fn active_overlay() -> (Overlay, Endpoint) {
        let (host, preview) = channel_pair();
        let mut overlay = Overlay::new(hero_document(), preview);
        overlay.handle_message(DesignModeMessage::SetDesignMode { enabled: true });
        (overlay, host)
    }

    #[tokio::test]
    async fn test_inactive_overlay_emits_nothing() {
        let (host, preview) = channel_pair();
        let mut host = host;
        let mut overlay = Overlay::new(hero_document(), preview);

        overlay.pointer_moved(&vec![0, 0]);
        overlay.clicked(&vec![0, 0]);
        overlay.handle_message(DesignModeMessage::RequestElementsState);

        assert_eq!(overlay.state(), &OverlayState::Inactive);
        assert!(host.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_hover_highlights_without_message() {
        let (mut overlay, mut host) = active_overlay();

        overlay.pointer_moved(&vec![0, 0]);

        assert_eq!(
            overlay.highlighted().map(|id| id.as_str()),
            Some("/src/hero.tsx:2:2")
        );
        assert!(host.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_click_emits_selection_with_snapshot() {
        let (mut overlay, mut host) = active_overlay();

        overlay.clicked(&vec![0, 0]);

        let Some(DesignModeMessage::ElementSelected { id, element }) = host.recv().await else {
            panic!("expected selection message");
        };
        assert_eq!(id.as_str(), "/src/hero.tsx:2:2");
        assert_eq!(element.tag_name, "h1");
        assert_eq!(element.class_name.as_deref(), Some("text-lg"));
        assert_eq!(element.text_content.as_deref(), Some("Hello"));
        assert_eq!(element.styles.get("font-size").map(String::as_str), Some("18px"));
    }

    #[tokio::test]
    async fn test_live_update_patches_selected_element_only() {
        let (mut overlay, _host) = active_overlay();
        overlay.clicked(&vec![0, 0]);

        overlay.handle_message(DesignModeMessage::UpdateElement {
            id: ElementIdentity::from("/src/hero.tsx:2:2"),
            updates: ElementUpdates {
                class_name: Some("text-xl".to_string()),
                text_content: Some("New".to_string()),
                ..Default::default()
            },
        });

        let h1 = overlay.document().element_at(&[0, 0]).unwrap();
        assert_eq!(h1.attributes.get("class").map(String::as_str), Some("text-xl"));
        assert_eq!(h1.text.as_deref(), Some("New"));
    }

    #[tokio::test]
    async fn test_live_update_for_unselected_identity_ignored() {
        let (mut overlay, _host) = active_overlay();
        overlay.clicked(&vec![0, 0]);

        overlay.handle_message(DesignModeMessage::UpdateElement {
            id: ElementIdentity::from("/src/hero.tsx:1:0"),
            updates: ElementUpdates {
                class_name: Some("hacked".to_string()),
                ..Default::default()
            },
        });

        let section = overlay.document().element_at(&[0]).unwrap();
        assert!(section.attributes.get("class").is_none());
    }

    #[tokio::test]
    async fn test_elements_state_round_trip() {
        let (mut overlay, mut host) = active_overlay();

        overlay.handle_message(DesignModeMessage::RequestElementsState);

        let Some(DesignModeMessage::ElementsState { elements }) = host.recv().await else {
            panic!("expected elements state");
        };
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].id.as_str(), "/src/hero.tsx:2:2");
        assert_eq!(
            elements[1].attributes.get("class").map(String::as_str),
            Some("text-lg")
        );
        // Identity attribute itself is not echoed as an observable attr
        assert!(!elements[1].attributes.contains_key(SOURCE_ATTR));
    }

    #[tokio::test]
    async fn test_disable_clears_everything() {
        let (mut overlay, _host) = active_overlay();
        overlay.pointer_moved(&vec![0, 0]);
        overlay.clicked(&vec![0, 0]);

        overlay.handle_message(DesignModeMessage::SetDesignMode { enabled: false });

        assert_eq!(overlay.state(), &OverlayState::Inactive);
        assert!(overlay.highlighted().is_none());
        assert!(overlay.selected().is_none());
    }

    #[tokio::test]
    async fn test_theme_variables_stored() {
        let (mut overlay, _host) = active_overlay();

        let mut light = std::collections::BTreeMap::new();
        light.insert("--bg".to_string(), "#fff".to_string());
        overlay.handle_message(DesignModeMessage::PushThemeVariables {
            theme: pagelift_protocol::ThemeVariables {
                light: light.clone(),
                dark: Default::default(),
            },
        });

        assert_eq!(overlay.document().theme.light, light);
    }
}
