use pagelift_common::{ElementIdentity, FileTreeError, StagedFileTree};
use pagelift_editor::{commit, CommitOutcome, EditorError, Mutation};
use pagelift_protocol::{
    DesignModeMessage, ElementData, ElementState, ElementUpdates, Endpoint, ThemeVariables,
};
use thiserror::Error;
use tracing::{info, warn};

/// Host-side editing state machine.
///
/// `Committing` is not represented as a stored variant: the commit cycle is
/// synchronous and single-threaded, so the session is observably either
/// `Dirty` (commit failed, patch retained) or `Inspecting` (commit
/// succeeded) by the time control returns to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Inspecting {
        id: ElementIdentity,
        element: ElementData,
    },
    Dirty {
        id: ElementIdentity,
        element: ElementData,
        pending: ElementUpdates,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("No element selected")]
    NoSelection,

    #[error("Nothing to commit")]
    NothingToCommit,

    #[error("Commit failed: {0}")]
    Commit(#[from] EditorError),

    #[error("File tree error: {0}")]
    FileTree(#[from] FileTreeError),
}

/// One user's editing session over one staged project.
pub struct EditingSession {
    files: StagedFileTree,
    endpoint: Endpoint,
    state: SessionState,
    /// Last bulk state reported by the preview, used to reconcile the
    /// inspector after a remount.
    elements_state: Vec<ElementState>,
}

impl EditingSession {
    pub fn new(files: StagedFileTree, endpoint: Endpoint) -> Self {
        Self {
            files,
            endpoint,
            state: SessionState::Idle,
            elements_state: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn files(&self) -> &StagedFileTree {
        &self.files
    }

    pub fn elements_state(&self) -> &[ElementState] {
        &self.elements_state
    }

    pub fn enable_design_mode(&mut self, enabled: bool) {
        self.endpoint
            .send(DesignModeMessage::SetDesignMode { enabled });
        if !enabled {
            self.state = SessionState::Idle;
        }
    }

    /// Ask the preview for every observable element's current attributes,
    /// e.g. to reconcile after a remount.
    pub fn request_elements_state(&self) {
        self.endpoint.send(DesignModeMessage::RequestElementsState);
    }

    pub fn push_theme_variables(&self, theme: ThemeVariables) {
        self.endpoint
            .send(DesignModeMessage::PushThemeVariables { theme });
    }

    /// Drain and handle every message already queued from the preview.
    pub fn process_pending(&mut self) {
        while let Some(message) = self.endpoint.try_recv() {
            self.handle_message(message);
        }
    }

    pub fn handle_message(&mut self, message: DesignModeMessage) {
        match message {
            DesignModeMessage::ElementSelected { id, element } => {
                // Selecting a different element while Dirty abandons any
                // uncommitted live patch to the previous one.
                if let SessionState::Dirty { id: previous, .. } = &self.state {
                    if *previous != id {
                        warn!(abandoned = %previous, "uncommitted patch abandoned by re-selection");
                    }
                }
                self.state = SessionState::Inspecting { id, element };
            }

            DesignModeMessage::ElementsState { elements } => {
                self.elements_state = elements;
            }

            other => {
                // Host → Preview messages echoing back mean a confused peer
                warn!(?other, "ignoring preview-bound message");
            }
        }
    }

    /// Edit one or more inspector fields. Sends an optimistic live-update
    /// for instant visual feedback (no durability) and marks the session
    /// dirty until commit.
    pub fn edit(&mut self, updates: ElementUpdates) -> Result<(), SessionError> {
        if updates.is_empty() {
            return Ok(());
        }

        let (id, element, mut pending) = match std::mem::replace(&mut self.state, SessionState::Idle)
        {
            SessionState::Inspecting { id, element } => (id, element, ElementUpdates::default()),
            SessionState::Dirty {
                id,
                element,
                pending,
            } => (id, element, pending),
            SessionState::Idle => return Err(SessionError::NoSelection),
        };

        pending.merge(&updates);

        self.endpoint.send(DesignModeMessage::UpdateElement {
            id: id.clone(),
            updates: pending.clone(),
        });

        self.state = SessionState::Dirty {
            id,
            element,
            pending,
        };
        Ok(())
    }

    /// Commit the pending patch durably: parse the file's current text from
    /// the staged tree, locate the node, mutate, regenerate, write back.
    ///
    /// On failure the tree is untouched and the session stays `Dirty`; the
    /// optimistic live DOM change is not rolled back.
    pub fn commit(&mut self) -> Result<CommitOutcome, SessionError> {
        let SessionState::Dirty {
            id,
            element,
            pending,
        } = self.state.clone()
        else {
            return Err(SessionError::NothingToCommit);
        };

        let mutations = to_mutations(&pending);
        let outcome = commit(&mut self.files, &id, &mutations)?;

        info!(file = %outcome.file, "commit succeeded; preview remount required");

        // Stay inspecting the same (now-current) element, folding the
        // committed patch into the displayed snapshot.
        self.state = SessionState::Inspecting {
            id,
            element: apply_to_snapshot(element, &pending),
        };

        Ok(outcome)
    }

    /// Explicitly drop the selection. Any uncommitted patch is abandoned.
    pub fn deselect(&mut self) {
        if let SessionState::Inspecting { id, .. } | SessionState::Dirty { id, .. } = &self.state {
            self.endpoint
                .send(DesignModeMessage::DeselectElement { id: id.clone() });
        }
        self.state = SessionState::Idle;
    }

    /// Serialized tree snapshot for mounting into the preview sandbox.
    pub fn mount_snapshot(&self) -> Result<String, SessionError> {
        Ok(self.files.to_json()?)
    }
}

fn to_mutations(updates: &ElementUpdates) -> Vec<Mutation> {
    let mut mutations = Vec::new();

    if let Some(value) = &updates.class_name {
        mutations.push(Mutation::UpdateClassAttribute {
            value: value.clone(),
        });
    }
    if let Some(value) = &updates.text_content {
        mutations.push(Mutation::UpdateTextContent {
            value: value.clone(),
        });
    }
    if let Some(value) = &updates.src {
        mutations.push(Mutation::UpdateAttribute {
            name: "src".to_string(),
            value: value.clone(),
        });
    }
    if let Some(value) = &updates.alt {
        mutations.push(Mutation::UpdateAttribute {
            name: "alt".to_string(),
            value: value.clone(),
        });
    }
    if let Some(value) = &updates.href {
        mutations.push(Mutation::UpdateAttribute {
            name: "href".to_string(),
            value: value.clone(),
        });
    }

    mutations
}

fn apply_to_snapshot(mut element: ElementData, updates: &ElementUpdates) -> ElementData {
    if updates.class_name.is_some() {
        element.class_name = updates.class_name.clone();
    }
    if updates.text_content.is_some() {
        element.text_content = updates.text_content.clone();
    }
    if updates.src.is_some() {
        element.src = updates.src.clone();
    }
    if updates.alt.is_some() {
        element.alt = updates.alt.clone();
    }
    if updates.href.is_some() {
        element.href = updates.href.clone();
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelift_protocol::channel_pair;

    fn session_with_hero() -> (EditingSession, Endpoint) {
        let mut files = StagedFileTree::new();
        files.create_dir("/src").unwrap();
        files
            .create_file("/src/hero.tsx", r#"<h1 className="text-lg">Hi</h1>"#)
            .unwrap();

        let (host, preview) = channel_pair();
        (EditingSession::new(files, host), preview)
    }

    fn select_hero(session: &mut EditingSession) {
        session.handle_message(DesignModeMessage::ElementSelected {
            id: ElementIdentity::from("/src/hero.tsx:1:0"),
            element: ElementData {
                tag_name: "h1".to_string(),
                class_name: Some("text-lg".to_string()),
                text_content: Some("Hi".to_string()),
                ..Default::default()
            },
        });
    }

    #[tokio::test]
    async fn test_selection_populates_inspector() {
        let (mut session, _preview) = session_with_hero();
        select_hero(&mut session);

        let SessionState::Inspecting { id, element } = session.state() else {
            panic!("expected inspecting state");
        };
        assert_eq!(id.as_str(), "/src/hero.tsx:1:0");
        assert_eq!(element.tag_name, "h1");
    }

    #[tokio::test]
    async fn test_edit_sends_optimistic_update_and_marks_dirty() {
        let (mut session, mut preview) = session_with_hero();
        select_hero(&mut session);

        session
            .edit(ElementUpdates {
                class_name: Some("text-xl".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert!(matches!(session.state(), SessionState::Dirty { .. }));
        let Some(DesignModeMessage::UpdateElement { id, updates }) = preview.recv().await else {
            panic!("expected live update message");
        };
        assert_eq!(id.as_str(), "/src/hero.tsx:1:0");
        assert_eq!(updates.class_name.as_deref(), Some("text-xl"));
        // Tree untouched until commit
        assert_eq!(
            session.files().read_file("/src/hero.tsx").unwrap(),
            r#"<h1 className="text-lg">Hi</h1>"#
        );
    }

    #[tokio::test]
    async fn test_edit_without_selection_fails() {
        let (mut session, _preview) = session_with_hero();

        let err = session
            .edit(ElementUpdates {
                class_name: Some("x".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, SessionError::NoSelection);
    }

    #[tokio::test]
    async fn test_commit_rewrites_file_and_returns_to_inspecting() {
        let (mut session, _preview) = session_with_hero();
        select_hero(&mut session);

        session
            .edit(ElementUpdates {
                class_name: Some("text-xl".to_string()),
                ..Default::default()
            })
            .unwrap();
        let outcome = session.commit().unwrap();

        assert_eq!(outcome.file, "/src/hero.tsx");
        assert_eq!(
            session.files().read_file("/src/hero.tsx").unwrap(),
            r#"<h1 className="text-xl">Hi</h1>"#
        );
        let SessionState::Inspecting { element, .. } = session.state() else {
            panic!("expected inspecting after commit");
        };
        assert_eq!(element.class_name.as_deref(), Some("text-xl"));
    }

    #[tokio::test]
    async fn test_failed_commit_stays_dirty_and_leaves_tree() {
        let (mut session, _preview) = session_with_hero();

        // Identity pointing far away from any node
        session.handle_message(DesignModeMessage::ElementSelected {
            id: ElementIdentity::from("/src/hero.tsx:99:0"),
            element: ElementData::default(),
        });
        session
            .edit(ElementUpdates {
                text_content: Some("New".to_string()),
                ..Default::default()
            })
            .unwrap();

        let err = session.commit().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Commit(EditorError::NodeNotFound { .. })
        ));
        assert!(matches!(session.state(), SessionState::Dirty { .. }));
        assert_eq!(
            session.files().read_file("/src/hero.tsx").unwrap(),
            r#"<h1 className="text-lg">Hi</h1>"#
        );
    }

    #[tokio::test]
    async fn test_reselection_abandons_pending_patch() {
        let (mut session, _preview) = session_with_hero();
        select_hero(&mut session);
        session
            .edit(ElementUpdates {
                class_name: Some("text-xl".to_string()),
                ..Default::default()
            })
            .unwrap();

        // Click elsewhere: implicit re-selection
        session.handle_message(DesignModeMessage::ElementSelected {
            id: ElementIdentity::from("/src/hero.tsx:5:2"),
            element: ElementData::default(),
        });

        assert!(matches!(session.state(), SessionState::Inspecting { .. }));
        let err = session.commit().unwrap_err();
        assert_eq!(err, SessionError::NothingToCommit);
        assert_eq!(
            session.files().read_file("/src/hero.tsx").unwrap(),
            r#"<h1 className="text-lg">Hi</h1>"#
        );
    }

    #[tokio::test]
    async fn test_deselect_sends_message_and_goes_idle() {
        let (mut session, mut preview) = session_with_hero();
        select_hero(&mut session);

        session.deselect();

        assert_eq!(session.state(), &SessionState::Idle);
        assert!(matches!(
            preview.recv().await,
            Some(DesignModeMessage::DeselectElement { .. })
        ));
    }

    #[tokio::test]
    async fn test_edits_accumulate_before_commit() {
        let (mut session, _preview) = session_with_hero();
        select_hero(&mut session);

        session
            .edit(ElementUpdates {
                class_name: Some("text-xl".to_string()),
                ..Default::default()
            })
            .unwrap();
        session
            .edit(ElementUpdates {
                text_content: Some("New".to_string()),
                ..Default::default()
            })
            .unwrap();
        session.commit().unwrap();

        assert_eq!(
            session.files().read_file("/src/hero.tsx").unwrap(),
            r#"<h1 className="text-xl">New</h1>"#
        );
    }
}
