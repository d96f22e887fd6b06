//! Template-only lifecycle: one document, no scene entry.

use super::{delete_released, FeatureResult};
use crate::config::ProjectionOptions;
use crate::model::{encode, to_pretty_string, Document, DocumentKey};
use crate::projection::{lookup, Lookup, Projector};
use crate::repo::{DocumentLink, DocumentStore, StoreResult};
use crate::sync::differs;
use log::{debug, info, warn};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// What a template push did remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateWrite {
    Created,
    Updated,
    Unchanged,
}

impl TemplateWrite {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Local template value plus its link once committed.
pub struct Descriptor<T: Document> {
    store: Arc<dyn DocumentStore>,
    value: T,
    link: Option<DocumentLink>,
}

impl<T: Document> Descriptor<T> {
    pub fn new(store: Arc<dyn DocumentStore>, value: T) -> Self {
        Self {
            store,
            value,
            link: None,
        }
    }

    /// Attaches to a stored document and pulls its value.
    pub fn load(store: Arc<dyn DocumentStore>, key: DocumentKey) -> StoreResult<Self> {
        let link = DocumentLink::attach(Arc::clone(&store), key);
        Self::from_link(link)
    }

    pub(crate) fn from_link(link: DocumentLink) -> StoreResult<Self> {
        let value = link.get_as()?;
        Ok(Self {
            store: Arc::clone(link.store()),
            value,
            link: Some(link),
        })
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn name(&self) -> &str {
        self.value.name()
    }

    pub fn link(&self) -> Option<&DocumentLink> {
        self.link.as_ref()
    }

    pub fn key(&self) -> Option<&DocumentKey> {
        self.link.as_ref().map(DocumentLink::key)
    }

    pub fn is_committed(&self) -> bool {
        self.link.is_some()
    }

    /// Creates the document, or replaces it when the local value differs.
    pub fn commit(&mut self) -> StoreResult<TemplateWrite> {
        let value = self.value.clone();
        self.push(value)
    }

    /// Commits `value` and adopts it locally only once the store accepted it.
    pub(crate) fn push(&mut self, value: T) -> StoreResult<TemplateWrite> {
        let write = match &self.link {
            None => {
                self.link = Some(DocumentLink::create_from(Arc::clone(&self.store), &value)?);
                TemplateWrite::Created
            }
            Some(link) => {
                let local = encode(&value)?;
                if differs(&link.get()?, &local) {
                    link.set(&local)?;
                    TemplateWrite::Updated
                } else {
                    TemplateWrite::Unchanged
                }
            }
        };
        self.value = value;

        info!(
            "event=template_commit module=feature status=ok kind={} name={} write={}",
            T::KIND,
            self.value.name(),
            write.as_str()
        );
        Ok(write)
    }

    /// Pulls the stored value; no-op when never committed.
    pub fn reset(&mut self) -> StoreResult<()> {
        if let Some(link) = &self.link {
            self.value = link.get_as()?;
            debug!(
                "event=template_reset module=feature status=ok kind={} key={}",
                T::KIND,
                link.key()
            );
        }
        Ok(())
    }

    /// Deletes the stored document and forgets the link. The local value stays.
    pub fn delete(&mut self) -> FeatureResult<()> {
        if let Some(link) = &self.link {
            delete_released(link)?;
            info!(
                "event=template_delete module=feature status=ok kind={} key={}",
                T::KIND,
                link.key()
            );
        }
        self.link = None;
        Ok(())
    }

    /// Forgets the link without deleting the document.
    pub(crate) fn release(&mut self) -> Option<DocumentLink> {
        self.link.take()
    }

    /// Stored document (or local draft) with references resolved.
    pub fn resolved(&self, projector: &Projector<'_>) -> StoreResult<Value> {
        let mut tree = match &self.link {
            Some(link) => link.get()?,
            None => encode(&self.value)?,
        };
        projector.resolve(&mut tree)?;
        Ok(tree)
    }

    pub fn projection(&self, projector: &Projector<'_>) -> StoreResult<Value> {
        let mut tree = self.resolved(projector)?;
        projector.hoist(&mut tree);
        Ok(tree)
    }

    pub fn get(&self, key: &str) -> StoreResult<Lookup> {
        let options = ProjectionOptions::default();
        let projector = Projector::new(self.store.as_ref(), &options);
        let result = lookup(self.projection(&projector)?, key);
        if let Lookup::Missing { key, .. } = &result {
            warn!(
                "event=feature_get module=feature status=miss kind={} name={} key={key}",
                T::KIND,
                self.value.name()
            );
        }
        Ok(result)
    }

    pub fn describe(&self) -> StoreResult<String> {
        let options = ProjectionOptions::default();
        let projector = Projector::new(self.store.as_ref(), &options);
        let rendered = to_pretty_string(&self.projection(&projector)?);
        Ok(if self.is_committed() {
            rendered
        } else {
            format!("local: {rendered}")
        })
    }
}

impl<T: Document> Display for Descriptor<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.describe() {
            Ok(text) => f.write_str(&text),
            Err(err) => write!(f, "<{} {}: {err}>", T::KIND, self.value.name()),
        }
    }
}
