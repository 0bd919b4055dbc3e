// 📚 Catalog - the public face of the store
//
// One `Catalog` owns one SQLite connection behind a mutex. Several handles
// may open the same database file (one per thread); SQLite serializes their
// writers and acceptance is the only operation that must not interleave.

use crate::changelog::{self, ChangelogEntry, ChangelogIter};
use crate::config::CatalogConfig;
use crate::db::open_connection;
use crate::editgroups::{self, Editgroup};
use crate::editors::{self, Editor};
use crate::edits::{self, Edit, EditAction, IdentityRef};
use crate::entities::{EntityBody, EntityType, Extra, Release, RelationKind, Work};
use crate::error::{CatalogError, Result};
use crate::expand::{ExpandFlags, HideFlags};
use crate::ident::{EditId, EditgroupId, EditorId, EntityId, RevisionId};
use crate::identities::{self, EntityState, Identity, Resolution};
use crate::revisions::{self, Revision};
use crate::validation::ExternalId;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

/// Reader view of one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub ident: EntityId,
    pub entity_type: EntityType,
    pub state: EntityState,
    /// Revision readers see; for redirects, the target's current revision
    pub revision: Option<RevisionId>,
    pub redirect: Option<EntityId>,
    pub body: Option<EntityBody>,
}

/// One accepted change to an identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub edit: Edit,
    pub editgroup: Editgroup,
    pub changelog: ChangelogEntry,
}

/// Release with the entities it links to, as selected by `ExpandFlags`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseExpansion {
    pub release: EntityView,
    pub work: Option<EntityView>,
    pub container: Option<EntityView>,
    pub creators: Vec<EntityView>,
    pub files: Vec<EntityView>,
}

pub struct Catalog {
    conn: Mutex<Connection>,
    config: CatalogConfig,
    default_editor: EditorId,
}

impl Catalog {
    /// Open (creating if needed) the catalog described by `config`
    pub fn open(config: CatalogConfig) -> Result<Self> {
        let mut conn = open_connection(&config)?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let default_editor = editors::ensure(&tx, &config.default_editor)?.id;
        tx.commit()?;

        tracing::info!(database = ?config.database, "catalog opened");
        Ok(Catalog {
            conn: Mutex::new(conn),
            config,
            default_editor,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Catalog::open(CatalogConfig::default())
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Editor named by `default_editor` in the config
    pub fn default_editor(&self) -> EditorId {
        self.default_editor
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *conn)
    }

    /// Run `f` inside one write transaction, rolling back on error
    fn write<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    // ========================================================================
    // CORE OPERATIONS
    // ========================================================================

    pub fn create_revision(&self, body: &EntityBody) -> Result<RevisionId> {
        self.write(|conn| revisions::create(conn, body))
    }

    pub fn get_revision(&self, id: &RevisionId) -> Result<Revision> {
        self.with_conn(|conn| revisions::get(conn, id))
    }

    pub fn create_editgroup(
        &self,
        submitter: &EditorId,
        description: Option<&str>,
        extra: Extra,
    ) -> Result<EditgroupId> {
        self.write(|conn| editgroups::create(conn, submitter, description, extra))
    }

    pub fn get_editgroup(&self, id: &EditgroupId) -> Result<Editgroup> {
        self.with_conn(|conn| editgroups::get(conn, id))
    }

    pub fn stage_edit(
        &self,
        editgroup: &EditgroupId,
        target: IdentityRef,
        previous_revision: Option<RevisionId>,
        action: EditAction,
    ) -> Result<Edit> {
        self.write(|conn| edits::stage_edit(conn, editgroup, target, previous_revision, action))
    }

    pub fn list_edits(&self, editgroup: &EditgroupId) -> Result<Vec<Edit>> {
        self.with_conn(|conn| edits::list_edits(conn, editgroup))
    }

    pub fn remove_edit(&self, id: &EditId) -> Result<Edit> {
        self.write(|conn| edits::remove_edit(conn, id))
    }

    /// Apply every edit of an open editgroup atomically
    pub fn accept_editgroup(&self, id: &EditgroupId) -> Result<ChangelogEntry> {
        self.with_conn(|conn| editgroups::accept(conn, id))
    }

    pub fn abandon_editgroup(&self, id: &EditgroupId) -> Result<()> {
        self.write(|conn| editgroups::abandon(conn, id))
    }

    pub fn resolve_identity(&self, id: &EntityId) -> Result<Resolution> {
        self.with_conn(|conn| identities::resolve(conn, id))
    }

    /// Changelog entries from `from_seq` on; `limit` is capped by the configured page size
    pub fn read_changelog(&self, from_seq: i64, limit: usize) -> Result<Vec<ChangelogEntry>> {
        let limit = limit.min(self.config.changelog_page());
        self.with_conn(|conn| changelog::read(conn, from_seq, limit))
    }

    /// Lazily page through the changelog starting at `from_seq`
    pub fn changelog_iter(
        &self,
        from_seq: i64,
    ) -> ChangelogIter<impl FnMut(i64, usize) -> Result<Vec<ChangelogEntry>> + '_> {
        ChangelogIter::new(
            move |from, limit| self.read_changelog(from, limit),
            from_seq,
            self.config.changelog_page(),
        )
    }

    pub fn changelog_entry(&self, seq: i64) -> Result<ChangelogEntry> {
        self.with_conn(|conn| changelog::get(conn, seq))
    }

    pub fn latest_changelog(&self) -> Result<Option<ChangelogEntry>> {
        self.with_conn(|conn| changelog::latest(conn))
    }

    pub fn changelog_for_editgroup(&self, id: &EditgroupId) -> Result<Option<ChangelogEntry>> {
        self.with_conn(|conn| changelog::for_editgroup(conn, id))
    }

    // ========================================================================
    // ENTITY CONVENIENCE WRITES
    // ========================================================================

    /// Create revision and stage a new identity for it.
    ///
    /// A release without `work_id` gets a fresh work staged in the same
    /// editgroup.
    pub fn create_entity(&self, editgroup: &EditgroupId, body: EntityBody) -> Result<Edit> {
        self.write(|conn| create_entity_in(conn, editgroup, body))
    }

    /// Stage a new revision for an existing identity, based on its current state
    pub fn update_entity(&self, editgroup: &EditgroupId, id: &EntityId, body: EntityBody) -> Result<Edit> {
        self.write(|conn| {
            let current = identities::get(conn, id)?;
            let rev = revisions::create(conn, &body)?;
            edits::stage_edit(
                conn,
                editgroup,
                IdentityRef::Existing(*id),
                current.revision,
                EditAction::Update(rev),
            )
        })
    }

    pub fn delete_entity(&self, editgroup: &EditgroupId, id: &EntityId) -> Result<Edit> {
        self.write(|conn| {
            let current = identities::get(conn, id)?;
            edits::stage_edit(
                conn,
                editgroup,
                IdentityRef::Existing(*id),
                current.revision,
                EditAction::Delete,
            )
        })
    }

    pub fn redirect_entity(&self, editgroup: &EditgroupId, id: &EntityId, target: &EntityId) -> Result<Edit> {
        self.write(|conn| {
            let current = identities::get(conn, id)?;
            edits::stage_edit(
                conn,
                editgroup,
                IdentityRef::Existing(*id),
                current.revision,
                EditAction::Redirect(*target),
            )
        })
    }

    /// Create an entity in its own editgroup and accept it immediately
    pub fn create_entity_autoaccept(
        &self,
        submitter: &EditorId,
        body: EntityBody,
    ) -> Result<(EntityId, ChangelogEntry)> {
        let (editgroup, edit) = self.write(|conn| {
            let editgroup = editgroups::create(conn, submitter, Some("autoaccept"), Extra::new())?;
            let edit = create_entity_in(conn, &editgroup, body)?;
            Ok((editgroup, edit))
        })?;

        match self.accept_editgroup(&editgroup) {
            Ok(entry) => Ok((edit.ident, entry)),
            Err(e) => {
                self.abandon_editgroup(&editgroup)?;
                Err(e)
            }
        }
    }

    // ========================================================================
    // ENTITY READS
    // ========================================================================

    /// Current view of an identity, following at most one redirect hop.
    ///
    /// Deleted identities come back with state `Deleted` and no body; wip
    /// identities are `NotFound`.
    pub fn get_entity(&self, id: &EntityId) -> Result<EntityView> {
        self.get_entity_with(id, HideFlags::none())
    }

    /// `get_entity` with the release fields named in `hide` left out
    pub fn get_entity_with(&self, id: &EntityId, hide: HideFlags) -> Result<EntityView> {
        self.with_conn(|conn| {
            let mut view = view_of(conn, identities::get(conn, id)?)?;
            if let Some(body) = view.body.as_mut() {
                hide.apply(body);
            }
            Ok(view)
        })
    }

    /// Live entity carrying this external identifier
    pub fn lookup(&self, extid: &ExternalId) -> Result<EntityView> {
        if let Some(error) = extid.check("lookup") {
            return Err(CatalogError::validation(vec![error]));
        }
        self.with_conn(|conn| {
            let identity = identities::find_by_external_id(conn, extid)?.ok_or_else(|| {
                CatalogError::NotFound(format!("{} '{}'", extid.kind(), extid.value()))
            })?;
            view_of(conn, identity)
        })
    }

    pub fn random_entity(&self, entity_type: EntityType) -> Result<EntityView> {
        self.with_conn(|conn| {
            let identity = identities::random_active(conn, entity_type)?
                .ok_or_else(|| CatalogError::NotFound(format!("any active {}", entity_type)))?;
            view_of(conn, identity)
        })
    }

    /// Accepted edits on an identity, newest first
    pub fn entity_history(&self, id: &EntityId) -> Result<Vec<HistoryEntry>> {
        self.with_conn(|conn| {
            identities::get(conn, id)?;
            edits::accepted_for_ident(conn, id)?
                .into_iter()
                .map(|edit| {
                    let editgroup = editgroups::get_row(conn, &edit.editgroup_id)?;
                    let changelog = changelog::for_editgroup(conn, &edit.editgroup_id)?.ok_or_else(|| {
                        CatalogError::NotFound(format!("changelog entry for {}", edit.editgroup_id))
                    })?;
                    Ok(HistoryEntry {
                        edit,
                        editgroup,
                        changelog,
                    })
                })
                .collect()
        })
    }

    pub fn get_release_expanded(
        &self,
        id: &EntityId,
        expand: ExpandFlags,
        hide: HideFlags,
    ) -> Result<ReleaseExpansion> {
        self.with_conn(|conn| {
            let view = view_of(conn, identities::get(conn, id)?)?;
            if view.entity_type != EntityType::Release {
                return Err(CatalogError::NotFound(format!("release {}", id)));
            }

            let mut shown = view.clone();
            if let Some(body) = shown.body.as_mut() {
                hide.apply(body);
            }
            let mut expansion = ReleaseExpansion {
                release: shown,
                work: None,
                container: None,
                creators: Vec::new(),
                files: Vec::new(),
            };
            let Some(release) = view.body.as_ref().and_then(EntityBody::as_release) else {
                return Ok(expansion);
            };

            if expand.work {
                expansion.work = visible(conn, release.work_id)?;
            }
            if expand.container {
                expansion.container = visible(conn, release.container_id)?;
            }
            if expand.creators {
                for creator in release.creator_ids() {
                    if let Some(v) = visible(conn, Some(creator))? {
                        expansion.creators.push(v);
                    }
                }
            }
            if expand.files {
                let effective = view.redirect.unwrap_or(view.ident);
                expansion.files = referrers_of(conn, RelationKind::Release, &effective, EntityType::File)?;
            }
            Ok(expansion)
        })
    }

    /// Active releases whose current revision belongs to this work
    pub fn releases_for_work(&self, work: &EntityId) -> Result<Vec<EntityView>> {
        self.with_conn(|conn| referrers_of(conn, RelationKind::Work, work, EntityType::Release))
    }

    /// Active files whose current revision lists this release
    pub fn files_for_release(&self, release: &EntityId) -> Result<Vec<EntityView>> {
        self.with_conn(|conn| referrers_of(conn, RelationKind::Release, release, EntityType::File))
    }

    pub fn count_entities(&self, entity_type: EntityType) -> Result<i64> {
        self.with_conn(|conn| identities::count(conn, entity_type, true))
    }

    // ========================================================================
    // EDITORS
    // ========================================================================

    pub fn create_editor(&self, username: &str) -> Result<Editor> {
        self.write(|conn| editors::create_editor(conn, username, false, false))
    }

    pub fn get_editor(&self, id: &EditorId) -> Result<Editor> {
        self.with_conn(|conn| editors::get(conn, id))
    }

    pub fn get_editor_by_username(&self, username: &str) -> Result<Editor> {
        self.with_conn(|conn| editors::get_by_username(conn, username))
    }

    /// The editor's open editgroup, created on first use
    pub fn active_editgroup(&self, editor: &EditorId) -> Result<EditgroupId> {
        self.write(|conn| editors::active_editgroup(conn, editor))
    }

    pub fn editgroups_for_editor(&self, editor: &EditorId) -> Result<Vec<Editgroup>> {
        self.with_conn(|conn| editgroups::list_for_editor(conn, editor))
    }
}

fn create_entity_in(conn: &Connection, editgroup: &EditgroupId, body: EntityBody) -> Result<Edit> {
    let body = match body {
        EntityBody::Release(release) if release.work_id.is_none() => {
            let work_rev = revisions::create(conn, &EntityBody::from(Work::new()))?;
            let work = edits::stage_edit(
                conn,
                editgroup,
                IdentityRef::New(EntityType::Work),
                None,
                EditAction::Update(work_rev),
            )?;
            EntityBody::from(Release {
                work_id: Some(work.ident),
                ..release
            })
        }
        other => other,
    };

    let rev = revisions::create(conn, &body)?;
    edits::stage_edit(
        conn,
        editgroup,
        IdentityRef::New(body.entity_type()),
        None,
        EditAction::Update(rev),
    )
}

fn view_of(conn: &Connection, identity: Identity) -> Result<EntityView> {
    let state = identity.state();
    let (revision, body) = match state {
        EntityState::Wip => return Err(CatalogError::NotFound(format!("identity {}", identity.id))),
        EntityState::Deleted => (None, None),
        EntityState::Active => match identity.revision {
            Some(rev) => (Some(rev), Some(revisions::get(conn, &rev)?.body)),
            None => (None, None),
        },
        EntityState::Redirect => match identities::resolve(conn, &identity.id) {
            Ok(Resolution::RedirectsTo { target, .. }) => match target.revision {
                Some(rev) => (Some(rev), Some(revisions::get(conn, &rev)?.body)),
                None => (None, None),
            },
            Ok(Resolution::Current(_)) | Err(CatalogError::Gone(_)) => (None, None),
            Err(e) => return Err(e),
        },
    };

    Ok(EntityView {
        ident: identity.id,
        entity_type: identity.entity_type,
        state,
        revision,
        redirect: identity.redirect,
        body,
    })
}

/// View of a linked identity; `None` when unset or not visible to readers
fn visible(conn: &Connection, id: Option<EntityId>) -> Result<Option<EntityView>> {
    let Some(id) = id else {
        return Ok(None);
    };
    match identities::get(conn, &id).and_then(|identity| view_of(conn, identity)) {
        Ok(view) => Ok(Some(view)),
        Err(CatalogError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn referrers_of(
    conn: &Connection,
    kind: RelationKind,
    target: &EntityId,
    entity_type: EntityType,
) -> Result<Vec<EntityView>> {
    identities::referrers(conn, kind, target)?
        .into_iter()
        .filter(|identity| identity.entity_type == entity_type)
        .map(|identity| view_of(conn, identity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Container, Creator, File, ReleaseContrib};

    fn setup() -> Catalog {
        Catalog::in_memory().unwrap()
    }

    /// Create and accept one entity, returning its id
    fn accepted(catalog: &Catalog, body: impl Into<EntityBody>) -> EntityId {
        catalog
            .create_entity_autoaccept(&catalog.default_editor(), body.into())
            .unwrap()
            .0
    }

    #[test]
    fn test_open_bootstraps_default_editor() {
        let catalog = setup();
        let editor = catalog.get_editor(&catalog.default_editor()).unwrap();
        assert_eq!(editor.username, "admin");
        assert!(editor.is_admin);
    }

    #[test]
    fn test_release_without_work_gets_one() {
        let catalog = setup();
        let eg = catalog.create_editgroup(&catalog.default_editor(), None, Extra::new()).unwrap();

        let edit = catalog.create_entity(&eg, Release::new("orphan paper").into()).unwrap();
        assert_eq!(catalog.list_edits(&eg).unwrap().len(), 2);
        catalog.accept_editgroup(&eg).unwrap();

        let view = catalog.get_entity(&edit.ident).unwrap();
        let work_id = view.body.as_ref().and_then(EntityBody::as_release).and_then(|r| r.work_id).unwrap();
        assert_eq!(catalog.get_entity(&work_id).unwrap().state, EntityState::Active);

        let siblings = catalog.releases_for_work(&work_id).unwrap();
        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].ident, edit.ident);
    }

    #[test]
    fn test_update_uses_observed_base() {
        let catalog = setup();
        let id = accepted(&catalog, Container::new("Journal of Stuff"));
        let before = catalog.get_entity(&id).unwrap();

        let eg = catalog.active_editgroup(&catalog.default_editor()).unwrap();
        let edit = catalog.update_entity(&eg, &id, Container::new("Journal of Things").into()).unwrap();
        assert_eq!(edit.previous_revision, before.revision);
        catalog.accept_editgroup(&eg).unwrap();

        let after = catalog.get_entity(&id).unwrap();
        match after.body {
            Some(EntityBody::Container(c)) => assert_eq!(c.name, "Journal of Things"),
            other => panic!("unexpected body {:?}", other),
        }
        // Accepting cleared the active pointer
        assert!(catalog.get_editor(&catalog.default_editor()).unwrap().active_editgroup.is_none());
    }

    #[test]
    fn test_redirect_and_delete_views() {
        let catalog = setup();
        let a = accepted(&catalog, Creator::new("A. Person"));
        let b = accepted(&catalog, Creator::new("Alice Person"));

        let eg = catalog.create_editgroup(&catalog.default_editor(), None, Extra::new()).unwrap();
        catalog.redirect_entity(&eg, &a, &b).unwrap();
        catalog.accept_editgroup(&eg).unwrap();

        let view = catalog.get_entity(&a).unwrap();
        assert_eq!(view.state, EntityState::Redirect);
        assert_eq!(view.redirect, Some(b));
        assert_eq!(view.revision, catalog.get_entity(&b).unwrap().revision);

        let eg = catalog.create_editgroup(&catalog.default_editor(), None, Extra::new()).unwrap();
        catalog.delete_entity(&eg, &b).unwrap();
        catalog.accept_editgroup(&eg).unwrap();

        let gone = catalog.get_entity(&b).unwrap();
        assert_eq!(gone.state, EntityState::Deleted);
        assert!(gone.body.is_none());
        assert!(matches!(catalog.resolve_identity(&b), Err(CatalogError::Gone(_))));
        assert!(matches!(catalog.resolve_identity(&a), Err(CatalogError::Gone(_))));
    }

    #[test]
    fn test_lookup_by_external_id() {
        let catalog = setup();
        let mut creator = Creator::new("Grace Hopper");
        creator.orcid = Some("0000-0002-1825-0097".to_string());
        let id = accepted(&catalog, creator);

        let found = catalog.lookup(&ExternalId::Orcid("0000-0002-1825-0097".to_string())).unwrap();
        assert_eq!(found.ident, id);

        let missing = catalog.lookup(&ExternalId::Orcid("0000-0000-0000-0000".to_string()));
        assert!(matches!(missing, Err(CatalogError::NotFound(_))));
        let malformed = catalog.lookup(&ExternalId::Orcid("grace".to_string()));
        assert!(matches!(malformed, Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_history_newest_first() {
        let catalog = setup();
        let id = accepted(&catalog, Container::new("v1"));
        let eg = catalog.create_editgroup(&catalog.default_editor(), Some("rename"), Extra::new()).unwrap();
        catalog.update_entity(&eg, &id, Container::new("v2").into()).unwrap();
        catalog.accept_editgroup(&eg).unwrap();

        let history = catalog.entity_history(&id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].changelog.seq, 2);
        assert_eq!(history[0].editgroup.description.as_deref(), Some("rename"));
        assert_eq!(history[1].changelog.seq, 1);
        assert!(history[1].edit.previous_revision.is_none());
    }

    #[test]
    fn test_release_expansion() {
        let catalog = setup();
        let container = accepted(&catalog, Container::new("Papers Monthly"));
        let creator = accepted(&catalog, Creator::new("Ada Lovelace"));

        let mut release = Release::new("Notes");
        release.container_id = Some(container);
        release.contribs.push(ReleaseContrib {
            creator_id: Some(creator),
            role: Some("author".to_string()),
            ..ReleaseContrib::default()
        });
        let release_id = accepted(&catalog, release);

        let mut file = File::with_sha1("7d97e98f8af710c7e7fe703abc8f639e0ee507c4");
        file.release_ids.push(release_id);
        let file_id = accepted(&catalog, file);

        let full = catalog
            .get_release_expanded(&release_id, ExpandFlags::all(), HideFlags::none())
            .unwrap();
        assert_eq!(full.container.map(|c| c.ident), Some(container));
        assert_eq!(full.creators.len(), 1);
        assert!(full.work.is_some());
        assert_eq!(full.files.iter().map(|f| f.ident).collect::<Vec<_>>(), vec![file_id]);

        let bare = catalog
            .get_release_expanded(&release_id, "container".parse().unwrap(), "contribs".parse().unwrap())
            .unwrap();
        assert!(bare.work.is_none());
        assert!(bare.files.is_empty());
        assert!(bare.container.is_some());
        let shown = bare.release.body.as_ref().and_then(EntityBody::as_release).unwrap();
        assert!(shown.contribs.is_empty());
        // Expansion still follows the contribs that were hidden
        let trimmed = catalog
            .get_release_expanded(&release_id, "creators".parse().unwrap(), "contribs".parse().unwrap())
            .unwrap();
        assert_eq!(trimmed.creators.len(), 1);

        let view = catalog.get_entity_with(&release_id, "contribs,refs".parse().unwrap()).unwrap();
        let shown = view.body.as_ref().and_then(EntityBody::as_release).unwrap();
        assert!(shown.contribs.is_empty());
        assert_eq!(shown.container_id, Some(container));
        assert_eq!(catalog.get_entity(&release_id).unwrap().revision, view.revision);

        assert!(catalog
            .get_release_expanded(&container, ExpandFlags::none(), HideFlags::none())
            .is_err());
    }

    #[test]
    fn test_autoaccept_failure_abandons_group() {
        let catalog = setup();
        let result = catalog.create_entity_autoaccept(&catalog.default_editor(), Container::new("").into());
        assert!(matches!(result, Err(CatalogError::Validation(_))));
        assert!(catalog.latest_changelog().unwrap().is_none());
    }

    #[test]
    fn test_changelog_paging_is_capped() {
        let catalog = Catalog::open(CatalogConfig {
            max_changelog_page: 2,
            ..CatalogConfig::default()
        })
        .unwrap();
        for i in 0..5 {
            accepted(&catalog, Container::new(&format!("c{}", i)));
        }

        assert_eq!(catalog.read_changelog(1, 100).unwrap().len(), 2);
        let seqs: Vec<i64> = catalog.changelog_iter(1).map(|e| e.unwrap().seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        assert_eq!(catalog.latest_changelog().unwrap().map(|e| e.seq), Some(5));
    }

    #[test]
    fn test_zero_page_size_still_pages() {
        let catalog = Catalog::open(CatalogConfig {
            max_changelog_page: 0,
            ..CatalogConfig::default()
        })
        .unwrap();
        for i in 0..3 {
            accepted(&catalog, Container::new(&format!("c{}", i)));
        }

        assert_eq!(catalog.read_changelog(1, 10).unwrap().len(), 1);
        assert_eq!(catalog.changelog_iter(1).count(), 3);
    }

    #[test]
    fn test_random_entity() {
        let catalog = setup();
        assert!(matches!(
            catalog.random_entity(EntityType::Creator),
            Err(CatalogError::NotFound(_))
        ));
        let id = accepted(&catalog, Creator::new("Only One"));
        assert_eq!(catalog.random_entity(EntityType::Creator).unwrap().ident, id);
        assert_eq!(catalog.count_entities(EntityType::Creator).unwrap(), 1);
    }
}
