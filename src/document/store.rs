//! Single-document store
//!
//! Control flow of every public operation:
//!
//! 1. Hydrate state from the backend (once per process, then cached)
//! 2. Enforce policy (read-only)
//! 3. For writes, resolve the validator, inferring a descriptor from the
//!    payload when none is installed
//! 4. Validate (pass-through, or stripping under auto-strip)
//! 5. Persist document + audit trail (+ freshly inferred descriptor) in one
//!    `put_many`
//! 6. Only then update the in-memory state
//!
//! A rejected or failed write leaves memory and storage exactly as before.
//!
//! The store takes `&mut self` everywhere: callers (see `StoreRegistry`)
//! guarantee one invocation at a time, so no internal locking is needed.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::audit::{AuditAction, AuditEntry, AuditTrail, DEFAULT_AUDIT_CAPACITY};
use crate::kv::KvStore;
use crate::observability::{log_event, Event};
use crate::policy::{Policy, PolicyPatch};
use crate::schema::{
    infer_element, infer_shape, json_type_name, CheckMode, Descriptor, SchemaDiff, ValidationError,
    Validator, Violation,
};

use super::errors::{StoreError, StoreResult};
use super::types::{Document, Mode};

/// Backend key of the document
pub const DOCUMENT_KEY: &str = "document";
/// Backend key of the descriptor
pub const SCHEMA_KEY: &str = "schema";
/// Backend key of the policy
pub const OPTIONS_KEY: &str = "options";
/// Backend key of the audit trail
pub const AUDIT_KEY: &str = "audit";

/// Hydrated in-memory mirror of the four persisted keys
#[derive(Debug)]
struct State {
    document: Document,
    validator: Option<Validator>,
    policy: Policy,
    audit: AuditTrail,
}

/// A validated mutation that has not been persisted yet
struct Plan {
    document: Document,
    installed: Option<Validator>,
    entry: AuditEntry,
}

impl Plan {
    fn new(action: AuditAction, keys: Vec<String>, document: Document, installed: Option<Validator>) -> Self {
        Self {
            document,
            installed,
            entry: AuditEntry::now(action, keys),
        }
    }
}

impl State {
    fn descriptor(&self) -> Option<&Descriptor> {
        self.validator.as_ref().map(Validator::descriptor)
    }

    fn ensure_writable(&self, operation: &'static str) -> StoreResult<()> {
        if self.policy.read_only {
            return Err(StoreError::ReadOnly { operation });
        }
        Ok(())
    }

    /// Object payload as it will be merged: under auto-strip, fields the
    /// descriptor does not declare are dropped. Keys already in the document
    /// are never touched.
    fn incoming(&self, validator: &Validator, fields: Map<String, Value>) -> Map<String, Value> {
        if self.policy.auto_strip {
            validator.strip_undeclared(fields)
        } else {
            fields
        }
    }

    /// Mode the store is bound to: the descriptor's kind when one is
    /// installed, otherwise the shape of a non-empty document.
    fn bound_mode(&self) -> Option<Mode> {
        match self.descriptor() {
            Some(descriptor) => Some(descriptor_mode(descriptor)),
            None if self.document.is_empty() => None,
            None => Some(self.document.mode()),
        }
    }

    fn admit(&self, operation: &'static str, wanted: Mode) -> StoreResult<()> {
        match self.bound_mode() {
            Some(mode) if mode != wanted => Err(StoreError::Mode {
                operation,
                mode: mode.as_str(),
            }),
            _ => Ok(()),
        }
    }

    /// Current object to build on; an array left over from before a
    /// descriptor switch is replaced.
    fn object_base(&self, operation: &'static str) -> StoreResult<Map<String, Value>> {
        self.admit(operation, Mode::Object)?;
        Ok(self.document.as_object().cloned().unwrap_or_default())
    }

    fn array_base(&self, operation: &'static str) -> StoreResult<Vec<Value>> {
        self.admit(operation, Mode::Array)?;
        Ok(self.document.as_array().map(<[Value]>::to_vec).unwrap_or_default())
    }

    /// Installed validator, or one compiled from an inferred descriptor.
    ///
    /// The flag is true when the validator is new and must be installed.
    fn validator_or_infer(&self, infer: impl FnOnce() -> Descriptor) -> (Validator, bool) {
        match &self.validator {
            Some(validator) => (validator.clone(), false),
            None => (Validator::compile(infer()), true),
        }
    }

    fn plan_set(&self, key: &str, value: Value) -> StoreResult<Plan> {
        const OP: &str = "set";
        self.ensure_writable(OP)?;
        let mut next = self.object_base(OP)?;

        let mut payload = Map::new();
        payload.insert(key.to_string(), value);
        let (validator, fresh) =
            self.validator_or_infer(|| Descriptor::object(infer_shape(&payload)));

        next.extend(self.incoming(&validator, payload));
        let cleaned = validator.check(&Value::Object(next), CheckMode::PassThrough)?;

        Ok(Plan::new(
            AuditAction::Set,
            vec![key.to_string()],
            into_document(cleaned),
            fresh.then_some(validator),
        ))
    }

    fn plan_set_all(&self, value: Value) -> StoreResult<Plan> {
        const OP: &str = "setAll";
        self.ensure_writable(OP)?;

        match value {
            Value::Object(fields) => {
                let mut merged = self.object_base(OP)?;
                let (validator, fresh) =
                    self.validator_or_infer(|| Descriptor::object(infer_shape(&fields)));

                let keys: Vec<String> = fields.keys().cloned().collect();
                merged.extend(self.incoming(&validator, fields));
                let cleaned = validator.check(&Value::Object(merged), CheckMode::PassThrough)?;

                Ok(Plan::new(
                    AuditAction::SetAll,
                    keys,
                    into_document(cleaned),
                    fresh.then_some(validator),
                ))
            }
            Value::Array(items) => {
                self.admit(OP, Mode::Array)?;
                let (validator, fresh) =
                    self.validator_or_infer(|| Descriptor::array(infer_element(&items)));

                // auto-strip applies to object payloads only
                let cleaned = validator.check(&Value::Array(items), CheckMode::PassThrough)?;

                Ok(Plan::new(
                    AuditAction::SetAll,
                    Vec::new(),
                    into_document(cleaned),
                    fresh.then_some(validator),
                ))
            }
            scalar => Err(ValidationError::new(vec![Violation::type_mismatch(
                "$root",
                "object or array",
                json_type_name(&scalar),
            )])
            .into()),
        }
    }

    fn plan_push(&self, item: Value) -> StoreResult<Plan> {
        const OP: &str = "push";
        self.ensure_writable(OP)?;
        let mut items = self.array_base(OP)?;

        let (validator, fresh) = self.validator_or_infer(|| {
            Descriptor::array(infer_element(std::slice::from_ref(&item)))
        });

        let cleaned = validator.check_element_value(&item, CheckMode::PassThrough)?;
        items.push(cleaned);

        Ok(Plan::new(
            AuditAction::Push,
            Vec::new(),
            Document::Array(items),
            fresh.then_some(validator),
        ))
    }

    fn plan_delete(&self, key: &str) -> StoreResult<Plan> {
        const OP: &str = "delete";
        self.ensure_writable(OP)?;

        let mut map = self.object_base(OP)?;
        map.remove(key);

        Ok(Plan::new(
            AuditAction::Delete,
            vec![key.to_string()],
            Document::Object(map),
            None,
        ))
    }

    fn plan_clear(&self) -> StoreResult<Plan> {
        self.ensure_writable("clear")?;
        let emptied = match self.bound_mode() {
            Some(mode) => Document::empty(mode),
            None => self.document.emptied(),
        };
        Ok(Plan::new(AuditAction::Clear, Vec::new(), emptied, None))
    }
}

fn descriptor_mode(descriptor: &Descriptor) -> Mode {
    match descriptor {
        Descriptor::Object { .. } => Mode::Object,
        Descriptor::Array { .. } => Mode::Array,
    }
}

/// Successful checks against object/array descriptors return containers.
fn into_document(value: Value) -> Document {
    Document::from_value(value).unwrap_or_default()
}

fn corrupted(key: &'static str, reason: impl ToString) -> StoreError {
    StoreError::Corrupted {
        key,
        reason: reason.to_string(),
    }
}

/// A named store owning exactly one document
#[derive(Debug)]
pub struct DocumentStore {
    name: String,
    backend: Arc<dyn KvStore>,
    audit_capacity: usize,
    state: Option<State>,
}

impl DocumentStore {
    /// Create a store over `backend`. Nothing is read until first use.
    pub fn new(name: impl Into<String>, backend: Arc<dyn KvStore>) -> Self {
        Self {
            name: name.into(),
            backend,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            state: None,
        }
    }

    /// Set the audit trail capacity (applied at hydration)
    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether state has been loaded from the backend yet
    pub fn is_hydrated(&self) -> bool {
        self.state.is_some()
    }

    async fn load(&self) -> StoreResult<State> {
        let document = match self.backend.get(DOCUMENT_KEY).await? {
            Some(value) => Document::from_value(value)
                .ok_or_else(|| corrupted(DOCUMENT_KEY, "neither an object nor an array"))?,
            None => Document::default(),
        };

        let validator = match self.backend.get(SCHEMA_KEY).await? {
            Some(value) => {
                let descriptor: Descriptor =
                    serde_json::from_value(value).map_err(|e| corrupted(SCHEMA_KEY, e))?;
                Some(Validator::compile(descriptor))
            }
            None => None,
        };

        let policy = match self.backend.get(OPTIONS_KEY).await? {
            Some(value) => serde_json::from_value(value).map_err(|e| corrupted(OPTIONS_KEY, e))?,
            None => Policy::default(),
        };

        let audit = match self.backend.get(AUDIT_KEY).await? {
            Some(value) => {
                let entries: Vec<AuditEntry> =
                    serde_json::from_value(value).map_err(|e| corrupted(AUDIT_KEY, e))?;
                AuditTrail::from_entries(entries, self.audit_capacity)
            }
            None => AuditTrail::new(self.audit_capacity),
        };

        Ok(State {
            document,
            validator,
            policy,
            audit,
        })
    }

    /// Loads state on first call; later calls return the cached state.
    async fn hydrate(&mut self) -> StoreResult<&mut State> {
        let state = match self.state.take() {
            Some(state) => state,
            None => {
                let state = self.load().await?;
                log_event(
                    Event::StoreHydrated,
                    &self.name,
                    &format!(
                        "mode={} len={} schema={} audit={}",
                        state.document.mode(),
                        state.document.len(),
                        state.descriptor().map_or("none", Descriptor::kind),
                        state.audit.len()
                    ),
                );
                state
            }
        };
        Ok(self.state.insert(state))
    }

    /// Persists a planned mutation, then applies it to memory.
    async fn apply(&mut self, operation: &'static str, plan: StoreResult<Plan>) -> StoreResult<()> {
        let plan = match plan {
            Ok(plan) => plan,
            Err(err) => {
                log_event(Event::WriteRejected, &self.name, &format!("{}: {}", operation, err));
                return Err(err);
            }
        };

        let mut audit = self.hydrate().await?.audit.clone();
        audit.append(plan.entry);

        let mut batch = vec![
            (DOCUMENT_KEY.to_string(), plan.document.to_value()),
            (AUDIT_KEY.to_string(), serde_json::to_value(audit.entries())?),
        ];
        if let Some(validator) = &plan.installed {
            batch.push((SCHEMA_KEY.to_string(), serde_json::to_value(validator.descriptor())?));
        }

        if let Err(err) = self.backend.put_many(batch).await {
            log_event(Event::WriteFailed, &self.name, &format!("{}: {}", operation, err));
            return Err(err.into());
        }

        let inferred = plan.installed.as_ref().map(|v| v.descriptor().kind());
        let state = self.hydrate().await?;
        state.document = plan.document;
        state.audit = audit;
        if plan.installed.is_some() {
            state.validator = plan.installed;
        }

        if let Some(kind) = inferred {
            log_event(Event::SchemaInferred, &self.name, &format!("kind={}", kind));
        }
        log_event(Event::WriteCommit, &self.name, operation);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Value under `key`; `None` if absent or in array mode
    pub async fn get(&mut self, key: &str) -> StoreResult<Option<Value>> {
        let state = self.hydrate().await?;
        Ok(state.document.as_object().and_then(|map| map.get(key)).cloned())
    }

    /// The whole document
    pub async fn get_all(&mut self) -> StoreResult<Document> {
        Ok(self.hydrate().await?.document.clone())
    }

    /// Keys in lexicographic order; empty in array mode
    pub async fn keys(&mut self) -> StoreResult<Vec<String>> {
        let state = self.hydrate().await?;
        Ok(state
            .document
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// False in array mode
    pub async fn has(&mut self, key: &str) -> StoreResult<bool> {
        let state = self.hydrate().await?;
        Ok(state.document.as_object().map_or(false, |map| map.contains_key(key)))
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Write one key; the whole resulting document must validate.
    pub async fn set(&mut self, key: &str, value: Value) -> StoreResult<()> {
        let plan = self.hydrate().await?.plan_set(key, value);
        self.apply("set", plan).await
    }

    /// Merge an object into the document, or replace the array.
    pub async fn set_all(&mut self, value: Value) -> StoreResult<()> {
        let plan = self.hydrate().await?.plan_set_all(value);
        self.apply("setAll", plan).await
    }

    /// Append one element in array mode.
    pub async fn push(&mut self, item: Value) -> StoreResult<()> {
        let plan = self.hydrate().await?.plan_push(item);
        self.apply("push", plan).await
    }

    /// Remove a key; absent keys are not an error.
    pub async fn delete(&mut self, key: &str) -> StoreResult<()> {
        let plan = self.hydrate().await?.plan_delete(key);
        self.apply("delete", plan).await
    }

    /// Reset to the empty value of the current mode.
    ///
    /// The descriptor, policy and audit trail are kept.
    pub async fn clear(&mut self) -> StoreResult<()> {
        let plan = self.hydrate().await?.plan_clear();
        self.apply("clear", plan).await
    }

    // ------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------

    pub async fn get_schema(&mut self) -> StoreResult<Option<Descriptor>> {
        Ok(self.hydrate().await?.descriptor().cloned())
    }

    /// Replace the descriptor.
    ///
    /// Returns the advisory diff against the prior descriptor, `None` when
    /// there was none. The replacement is never blocked by the diff.
    pub async fn set_schema(&mut self, descriptor: Descriptor) -> StoreResult<Option<SchemaDiff>> {
        let state = self.hydrate().await?;
        let prior = state.descriptor().cloned();

        // An empty document takes the new kind at once; a non-empty one of
        // the other kind is replaced by the next write.
        let mode = descriptor_mode(&descriptor);
        let reshaped = (state.document.is_empty() && state.document.mode() != mode)
            .then(|| Document::empty(mode));

        let mut batch = vec![(SCHEMA_KEY.to_string(), serde_json::to_value(&descriptor)?)];
        if let Some(document) = &reshaped {
            batch.push((DOCUMENT_KEY.to_string(), document.to_value()));
        }
        self.backend.put_many(batch).await?;

        let diff = prior.as_ref().map(|p| SchemaDiff::between(p, &descriptor));
        let kind = descriptor.kind();
        let state = self.hydrate().await?;
        state.validator = Some(Validator::compile(descriptor));
        if let Some(document) = reshaped {
            state.document = document;
        }

        log_event(Event::SchemaReplaced, &self.name, &format!("kind={}", kind));
        if let Some(diff) = diff.as_ref().filter(|d| !d.is_empty()) {
            let detail = serde_json::to_string(diff).unwrap_or_default();
            log_event(Event::SchemaDrift, &self.name, &detail);
        }

        Ok(diff)
    }

    // ------------------------------------------------------------------
    // Policy
    // ------------------------------------------------------------------

    pub async fn get_options(&mut self) -> StoreResult<Policy> {
        Ok(self.hydrate().await?.policy)
    }

    /// Merge `patch` into the policy and persist it immediately.
    pub async fn set_options(&mut self, patch: PolicyPatch) -> StoreResult<Policy> {
        let policy = self.hydrate().await?.policy.merged(patch);

        self.backend
            .put(OPTIONS_KEY, serde_json::to_value(policy)?)
            .await?;
        self.hydrate().await?.policy = policy;

        log_event(
            Event::OptionsChanged,
            &self.name,
            &format!("autoStrip={} readOnly={}", policy.auto_strip, policy.read_only),
        );
        Ok(policy)
    }

    // ------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------

    /// All entries, newest first
    pub async fn get_audit_log(&mut self) -> StoreResult<Vec<AuditEntry>> {
        Ok(self.hydrate().await?.audit.entries())
    }

    pub async fn clear_audit_log(&mut self) -> StoreResult<()> {
        self.hydrate().await?;
        self.backend.put(AUDIT_KEY, Value::Array(Vec::new())).await?;
        self.hydrate().await?.audit.clear();

        log_event(Event::AuditCleared, &self.name, "");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemKvStore;
    use crate::schema::{shape, ElementType, TypeTag};
    use serde_json::json;

    fn new_store() -> (Arc<MemKvStore>, DocumentStore) {
        let backend = Arc::new(MemKvStore::new());
        let store = DocumentStore::new("test", backend.clone());
        (backend, store)
    }

    #[tokio::test]
    async fn test_fresh_store_is_empty_object() {
        let (_backend, mut store) = new_store();
        assert!(!store.is_hydrated());
        assert_eq!(store.get_all().await.unwrap(), json!({}));
        assert!(store.is_hydrated());
        assert!(store.get_schema().await.unwrap().is_none());
        assert_eq!(store.get_options().await.unwrap(), Policy::default());
        assert!(store.get_audit_log().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_set_infers_schema_from_single_field() {
        let (_backend, mut store) = new_store();
        store.set("email", json!("a@b.io")).await.unwrap();

        assert_eq!(
            store.get_schema().await.unwrap(),
            Some(Descriptor::object(shape([("email", TypeTag::Email)])))
        );
        assert_eq!(store.get("email").await.unwrap(), Some(json!("a@b.io")));
    }

    #[tokio::test]
    async fn test_set_validates_whole_document() {
        let (_backend, mut store) = new_store();
        store.set_all(json!({"name": "Alice", "age": 30})).await.unwrap();

        let err = store.set("age", json!("thirty")).await.unwrap_err();
        let validation = err.validation().unwrap();
        assert!(validation.has_path("age"));
        assert_eq!(store.get("age").await.unwrap(), Some(json!(30)));
        assert_eq!(store.get_audit_log().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_of_undeclared_key_without_strip_is_kept() {
        let (_backend, mut store) = new_store();
        store.set_all(json!({"name": "Alice"})).await.unwrap();
        store.set("nickname", json!("Al")).await.unwrap();
        assert_eq!(store.get("nickname").await.unwrap(), Some(json!("Al")));
    }

    #[tokio::test]
    async fn test_set_of_undeclared_key_with_strip_is_dropped() {
        let (_backend, mut store) = new_store();
        store.set_all(json!({"name": "Alice"})).await.unwrap();
        store.set_options(PolicyPatch::auto_strip(true)).await.unwrap();

        store.set("nickname", json!("Al")).await.unwrap();
        assert!(!store.has("nickname").await.unwrap());
        assert_eq!(store.get_audit_log().await.unwrap()[0].action, AuditAction::Set);
    }

    #[tokio::test]
    async fn test_set_all_merges_into_existing() {
        let (_backend, mut store) = new_store();
        store.set_all(json!({"a": 1, "b": 2})).await.unwrap();
        store.set_all(json!({"b": 3})).await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), json!({"a": 1, "b": 3}));
    }

    #[tokio::test]
    async fn test_set_all_scalar_is_rejected() {
        let (_backend, mut store) = new_store();
        let err = store.set_all(json!(42)).await.unwrap_err();
        assert!(err.validation().unwrap().has_path("$root"));
        assert!(store.get_schema().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_validation_does_not_install_inferred_schema() {
        let (backend, mut store) = new_store();
        assert!(store.set_all(json!("nope")).await.is_err());
        assert!(backend.get(SCHEMA_KEY).await.unwrap().is_none());
        assert!(backend.get(DOCUMENT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_push_initializes_array_and_infers_element() {
        let (_backend, mut store) = new_store();
        store.push(json!({"id": 1, "owner": "x@y.io"})).await.unwrap();
        store.push(json!({"id": 2, "owner": "z@y.io"})).await.unwrap();

        assert_eq!(
            store.get_schema().await.unwrap(),
            Some(Descriptor::array(ElementType::Object(shape([
                ("id", TypeTag::Number),
                ("owner", TypeTag::Email),
            ]))))
        );
        assert_eq!(store.get_all().await.unwrap().len(), 2);
        assert!(store.keys().await.unwrap().is_empty());
        assert!(!store.has("id").await.unwrap());
        assert_eq!(store.get("id").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_push_keeps_extra_fields_under_auto_strip() {
        let (_backend, mut store) = new_store();
        store.push(json!({"id": 1})).await.unwrap();
        store.set_options(PolicyPatch::auto_strip(true)).await.unwrap();
        store.push(json!({"id": 2, "extra": true})).await.unwrap();
        store.set_all(json!([{"id": 3, "extra": false}])).await.unwrap();

        assert_eq!(store.get_all().await.unwrap(), json!([{"id": 3, "extra": false}]));
    }

    #[tokio::test]
    async fn test_auto_strip_only_touches_incoming_fields() {
        let (_backend, mut store) = new_store();
        store.set_all(json!({"known": "x"})).await.unwrap();
        store.set("kept", json!(1)).await.unwrap();
        store.set_options(PolicyPatch::auto_strip(true)).await.unwrap();

        store.set_all(json!({"known": "y", "extra": "z"})).await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), json!({"known": "y", "kept": 1}));

        store.set("other", json!(2)).await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), json!({"known": "y", "kept": 1}));
        assert_eq!(store.get_audit_log().await.unwrap()[0].keys, vec!["other"]);
    }

    #[tokio::test]
    async fn test_set_schema_reshapes_empty_document() {
        let (backend, mut store) = new_store();
        store
            .set_schema(Descriptor::array(ElementType::Tag(TypeTag::Number)))
            .await
            .unwrap();

        assert_eq!(store.get_all().await.unwrap(), json!([]));
        assert_eq!(backend.get(DOCUMENT_KEY).await.unwrap(), Some(json!([])));

        let err = store.delete("x").await.unwrap_err();
        assert!(matches!(err, StoreError::Mode { operation: "delete", mode: "array" }));

        store.clear().await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), json!([]));
        let actions: Vec<AuditAction> =
            store.get_audit_log().await.unwrap().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![AuditAction::Clear]);
    }

    #[tokio::test]
    async fn test_clear_follows_descriptor_after_switch() {
        let (_backend, mut store) = new_store();
        store.set("a", json!(1)).await.unwrap();
        store
            .set_schema(Descriptor::array(ElementType::Tag(TypeTag::Number)))
            .await
            .unwrap();

        assert!(matches!(
            store.delete("a").await,
            Err(StoreError::Mode { operation: "delete", .. })
        ));
        store.clear().await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_mode_errors() {
        let (_backend, mut store) = new_store();
        store.push(json!(1)).await.unwrap();

        let err = store.set("a", json!(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Mode { operation: "set", mode: "array" }));

        let err = store.set_all(json!({"a": 1})).await.unwrap_err();
        assert!(matches!(err, StoreError::Mode { operation: "setAll", .. }));

        let err = store.delete("a").await.unwrap_err();
        assert!(matches!(err, StoreError::Mode { operation: "delete", .. }));

        let (_backend, mut store) = new_store();
        store.set("a", json!(1)).await.unwrap();
        let err = store.push(json!(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Mode { operation: "push", mode: "object" }));
        let err = store.set_all(json!([1])).await.unwrap_err();
        assert!(matches!(err, StoreError::Mode { operation: "setAll", mode: "object" }));
    }

    #[tokio::test]
    async fn test_set_schema_switches_mode_on_next_write() {
        let (_backend, mut store) = new_store();
        store.set("a", json!(1)).await.unwrap();

        let diff = store
            .set_schema(Descriptor::array(ElementType::Tag(TypeTag::Number)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(diff.changed[0].field, "$root");

        store.push(json!(5)).await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), json!([5]));
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_not_an_error() {
        let (_backend, mut store) = new_store();
        store.set_all(json!({"a": 1})).await.unwrap();
        store.delete("zzz").await.unwrap();
        store.delete("a").await.unwrap();

        assert_eq!(store.get_all().await.unwrap(), json!({}));
        let log = store.get_audit_log().await.unwrap();
        assert_eq!(log[0].action, AuditAction::Delete);
        assert_eq!(log[0].keys, vec!["a".to_string()]);
        assert_eq!(log[1].keys, vec!["zzz".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_keeps_mode_schema_policy() {
        let (_backend, mut store) = new_store();
        store.push(json!("x")).await.unwrap();
        store.set_options(PolicyPatch::auto_strip(true)).await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.get_all().await.unwrap(), json!([]));
        assert!(store.get_schema().await.unwrap().is_some());
        assert!(store.get_options().await.unwrap().auto_strip);
        assert_eq!(store.get_audit_log().await.unwrap()[0].action, AuditAction::Clear);
    }

    #[tokio::test]
    async fn test_read_only_blocks_every_mutation() {
        let (_backend, mut store) = new_store();
        store.set_all(json!({"a": 1})).await.unwrap();
        store.set_options(PolicyPatch::read_only(true)).await.unwrap();

        assert!(matches!(store.set("a", json!(2)).await, Err(StoreError::ReadOnly { .. })));
        assert!(matches!(store.set_all(json!({"a": 2})).await, Err(StoreError::ReadOnly { .. })));
        assert!(matches!(store.push(json!(2)).await, Err(StoreError::ReadOnly { .. })));
        assert!(matches!(store.delete("a").await, Err(StoreError::ReadOnly { .. })));
        assert!(matches!(store.clear().await, Err(StoreError::ReadOnly { .. })));

        assert_eq!(store.get_all().await.unwrap(), json!({"a": 1}));
        assert_eq!(store.get_audit_log().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_memory_untouched() {
        let (backend, mut store) = new_store();
        store.set_all(json!({"a": 1})).await.unwrap();

        backend.set_fail_writes(true);
        let err = store.set("a", json!(2)).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(!err.is_rejection());

        assert_eq!(store.get("a").await.unwrap(), Some(json!(1)));
        assert_eq!(store.get_audit_log().await.unwrap().len(), 1);

        backend.set_fail_writes(false);
        store.set("a", json!(3)).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_backend_failure_on_first_write_installs_nothing() {
        let (backend, mut store) = new_store();
        backend.set_fail_writes(true);
        assert!(store.set("a", json!(1)).await.is_err());
        assert!(store.get_schema().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hydrates_from_existing_backend_state() {
        let backend = Arc::new(MemKvStore::new());
        backend.put(DOCUMENT_KEY, json!({"n": 1})).await.unwrap();
        backend
            .put(SCHEMA_KEY, json!({"kind": "object", "fields": {"n": "number"}}))
            .await
            .unwrap();
        backend.put(OPTIONS_KEY, json!({"readOnly": true})).await.unwrap();
        backend
            .put(AUDIT_KEY, json!([{"timestamp": 1, "action": "set", "keys": ["n"]}]))
            .await
            .unwrap();

        let mut store = DocumentStore::new("restored", backend);
        assert_eq!(store.get("n").await.unwrap(), Some(json!(1)));
        assert!(store.get_options().await.unwrap().read_only);
        assert_eq!(store.get_audit_log().await.unwrap()[0].timestamp, 1);
        assert_eq!(
            store.get_schema().await.unwrap(),
            Some(Descriptor::object(shape([("n", TypeTag::Number)])))
        );
    }

    #[tokio::test]
    async fn test_corrupted_persisted_values() {
        let backend = Arc::new(MemKvStore::new());
        backend.put(DOCUMENT_KEY, json!("scalar")).await.unwrap();
        let mut store = DocumentStore::new("bad", backend);
        let err = store.get_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { key: DOCUMENT_KEY, .. }));
        assert!(!store.is_hydrated());

        let backend = Arc::new(MemKvStore::new());
        backend.put(SCHEMA_KEY, json!({"kind": "tree"})).await.unwrap();
        let mut store = DocumentStore::new("bad", backend);
        assert!(matches!(
            store.keys().await.unwrap_err(),
            StoreError::Corrupted { key: SCHEMA_KEY, .. }
        ));
    }

    #[tokio::test]
    async fn test_audit_capacity_is_configurable() {
        let backend = Arc::new(MemKvStore::new());
        let mut store = DocumentStore::new("small", backend).with_audit_capacity(3);
        for i in 0..10 {
            store.set("n", json!(i)).await.unwrap();
        }
        assert_eq!(store.get_audit_log().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_clear_audit_log_persists() {
        let (backend, mut store) = new_store();
        store.set("a", json!(1)).await.unwrap();
        store.clear_audit_log().await.unwrap();

        assert!(store.get_audit_log().await.unwrap().is_empty());
        assert_eq!(backend.get(AUDIT_KEY).await.unwrap(), Some(json!([])));
        assert_eq!(store.get("a").await.unwrap(), Some(json!(1)));
    }
}
