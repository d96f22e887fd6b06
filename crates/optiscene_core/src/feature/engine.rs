use super::{Descriptor, FeatureError, FeatureKind, FeatureResult};
use crate::model::{encode, to_pretty_string, DocumentKey, InstanceMetadata, SceneEntry, UniqueId};
use crate::projection::{lookup, Lookup};
use crate::repo::DocumentLink;
use crate::sync::{Reconciliation, SceneReconciler, SceneSession};
use log::{info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// One template plus one scene entry, moved between draft and durable state.
pub struct Feature<K: FeatureKind> {
    session: Arc<SceneSession>,
    template: Descriptor<K::Template>,
    instance: K::Instance,
    extra: K::Extra,
}

impl<K: FeatureKind> Feature<K> {
    pub(crate) fn new(
        session: Arc<SceneSession>,
        name: &str,
        description: &str,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        let store = Arc::clone(session.store());
        let template = Descriptor::new(Arc::clone(&store), K::new_template(name, description));
        let instance = K::new_instance(name, description, InstanceMetadata::from_entries(metadata));
        let extra = K::new_extra(&store, name);
        Self {
            session,
            template,
            instance,
            extra,
        }
    }

    /// Seeds a feature from an entry already in the scene.
    pub(crate) fn load(session: Arc<SceneSession>, entry: K::Instance) -> FeatureResult<Self> {
        let store = Arc::clone(session.store());
        let template = match K::template_key(&entry) {
            Some(key) => Descriptor::load(Arc::clone(&store), key)?,
            None => Descriptor::new(Arc::clone(&store), K::new_template(entry.name(), "")),
        };
        let extra = K::load_extra(&store, &entry, template.value())?;
        Ok(Self {
            session,
            template,
            instance: entry,
            extra,
        })
    }

    pub fn name(&self) -> &str {
        self.instance.name()
    }

    pub fn unique_id(&self) -> Option<&UniqueId> {
        self.instance.unique_id()
    }

    pub fn template(&self) -> &K::Template {
        self.template.value()
    }

    pub fn template_mut(&mut self) -> &mut K::Template {
        self.template.value_mut()
    }

    pub fn instance(&self) -> &K::Instance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut K::Instance {
        &mut self.instance
    }

    pub fn template_link(&self) -> Option<&DocumentLink> {
        self.template.link()
    }

    pub fn template_key(&self) -> Option<&DocumentKey> {
        self.template.key()
    }

    pub fn extra(&self) -> &K::Extra {
        &self.extra
    }

    pub(crate) fn extra_mut(&mut self) -> &mut K::Extra {
        &mut self.extra
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut K::Template, &mut K::Instance, &mut K::Extra) {
        (self.template.value_mut(), &mut self.instance, &mut self.extra)
    }

    pub fn session(&self) -> &Arc<SceneSession> {
        &self.session
    }

    /// Persists the template, then upserts the instance into the scene.
    ///
    /// The local template and instance are replaced only after every
    /// write succeeded. Released documents are deleted last.
    pub fn commit(&mut self) -> FeatureResult<Reconciliation> {
        let mut instance = self.instance.clone();
        if instance.unique_id().is_none() {
            instance
                .metadata_mut()
                .set_unique_id(Some(UniqueId::generate()));
        }
        let mut template = self.template.value().clone();

        K::commit_extra(&mut self.extra, &mut template, &mut instance)?;
        let template_write = self.template.push(template)?;
        K::bind_template(&mut instance, self.template.key());
        let outcome = SceneReconciler::new(&self.session).reconcile(&instance)?;
        self.instance = instance;
        K::after_commit(&mut self.extra, self.template.value())?;

        info!(
            "event=feature_commit module=feature status=ok kind={} name={} template_write={} scene_write={}",
            K::LABEL,
            self.name(),
            template_write.as_str(),
            outcome.wrote_scene()
        );
        Ok(outcome)
    }

    /// Replaces local state with the stored template and scene entry.
    /// Never committed parts are left alone.
    pub fn reset(&mut self) -> FeatureResult<()> {
        self.template.reset()?;
        K::reset_extra(&mut self.extra)?;
        if let Some(entry) = self.durable_entry()? {
            self.instance = entry;
        }
        info!(
            "event=feature_reset module=feature status=ok kind={} name={}",
            K::LABEL,
            self.name()
        );
        Ok(())
    }

    /// Removes the scene entry and releases owned documents.
    ///
    /// The local template and instance stay usable for a fresh commit.
    /// Without an identity this only releases documents. With one, the scene
    /// must still hold the entry or `IdentityMismatch` is returned and
    /// nothing is released.
    pub fn delete(&mut self) -> FeatureResult<()> {
        let Some(unique_id) = self.unique_id().cloned() else {
            K::delete_extra(&mut self.extra, self.template.value_mut(), &mut self.instance)?;
            self.template.delete()?;
            K::bind_template(&mut self.instance, None);
            return Ok(());
        };

        let session = Arc::clone(&self.session);
        let template = &mut self.template;
        let extra = &mut self.extra;
        let instance = &mut self.instance;
        SceneReconciler::new(&session).detach::<K::Instance, FeatureError>(&unique_id, |_| {
            K::delete_extra(extra, template.value_mut(), instance)?;
            template.delete()
        })?;

        K::bind_template(&mut self.instance, None);
        self.instance.metadata_mut().set_unique_id(None);
        info!(
            "event=feature_delete module=feature status=ok kind={} name={} unique_id={unique_id}",
            K::LABEL,
            self.name()
        );
        Ok(())
    }

    /// Scene entry carrying this feature's identity.
    pub fn durable_entry(&self) -> FeatureResult<Option<K::Instance>> {
        match self.unique_id() {
            Some(unique_id) => Ok(SceneReconciler::new(&self.session).lookup(unique_id)?),
            None => Ok(None),
        }
    }

    /// Durable entry if reconciled, else the local draft, with references
    /// resolved and `_properties` hoisted.
    pub fn projection(&self) -> FeatureResult<Value> {
        let (tree, _) = self.projection_with_origin()?;
        Ok(tree)
    }

    fn projection_with_origin(&self) -> FeatureResult<(Value, bool)> {
        let durable = self.durable_entry()?;
        let is_durable = durable.is_some();
        let mut tree = match durable {
            Some(entry) => encode(&entry)?,
            None => encode(&self.instance)?,
        };

        let projector = self.session.projector();
        projector.resolve(&mut tree)?;
        if let Value::Object(map) = &mut tree {
            K::project_drafts(map, &self.template, &self.extra, &projector)?;
        }
        projector.hoist(&mut tree);
        Ok((tree, is_durable))
    }

    /// Whole projection for an empty key, else the best prefix match.
    pub fn get(&self, key: &str) -> FeatureResult<Lookup> {
        let result = lookup(self.projection()?, key);
        if let Lookup::Missing { key, known_keys } = &result {
            warn!(
                "event=feature_get module=feature status=miss kind={} name={} key={key} known={}",
                K::LABEL,
                self.name(),
                known_keys.len()
            );
        }
        Ok(result)
    }

    /// Pretty projection, prefixed `local: ` while not in the scene.
    pub fn describe(&self) -> FeatureResult<String> {
        let (tree, is_durable) = self.projection_with_origin()?;
        let rendered = to_pretty_string(&tree);
        Ok(if is_durable {
            rendered
        } else {
            format!("local: {rendered}")
        })
    }
}

impl<K: FeatureKind> Display for Feature<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.describe() {
            Ok(text) => f.write_str(&text),
            Err(err) => write!(f, "<{} {}: {err}>", K::LABEL, self.name()),
        }
    }
}
