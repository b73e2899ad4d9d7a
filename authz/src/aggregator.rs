//! Aggregation of explicit, inherited, and policy-derived options.
//!
//! The order is fixed and later steps only fill keys not yet resolved:
//!
//! 1. the principal's own explicit option map (keys become `overwritten`),
//! 2. the inheritance walk up the ancestor chain, nearest first, suppressed
//!    entirely when the object carries explicit settings,
//! 3. policy statements matching the object, translated to option keys and
//!    combined across documents by the merge preference,
//! 4. registered extensions, lowest priority.
//!
//! Two precedence philosophies coexist on purpose: raw inheritance is
//! first-ancestor-wins, while policy merging is decisive-first-declaration.
//! Which one produced a value is visible in its `effect_source`.

use crate::context::EngineContext;
use crate::mapping;
use crate::merge::merge;
use options::{normalize_map, OptionMap, ResolvedEntry, ResolvedMap};
use policy::{IndexOutcome, IndexedStatement, PolicyLoader, StatementIndex};
use resource::ObjectRef;
use subject::Principal;
use tracing::{debug, warn};

pub struct Aggregator<'a> {
    ctx: &'a EngineContext,
}

impl<'a> Aggregator<'a> {
    pub fn new(ctx: &'a EngineContext) -> Self {
        Self { ctx }
    }

    /// Resolve the full option map for one `(principal, object)`.
    pub fn resolve(&self, principal: &Principal, object: &ObjectRef) -> ResolvedMap {
        let mut resolved = ResolvedMap::new();

        let explicit = self.explicit_options(principal, object);
        let object_overwritten = !explicit.is_empty();
        for (key, value) in explicit {
            resolved.insert(key, ResolvedEntry::explicit(value));
        }

        if !object_overwritten {
            self.inherit(principal, object, &mut resolved);
        }

        self.apply_policies(principal, object, &mut resolved);
        self.apply_extensions(principal, object, &mut resolved);

        debug!(
            "Resolved {} option(s) for {} on {}",
            resolved.len(),
            principal,
            object
        );
        resolved
    }

    /// The combined statement index for a principal: own attachments first,
    /// then sibling roles', then each ancestor's. Used for param lookups.
    pub fn combined_index(&self, principal: &Principal) -> StatementIndex {
        let loader = PolicyLoader::new(self.ctx.policies());
        let mut combined = StatementIndex::new();
        for key in self.source_keys(principal) {
            combined.merge_from(&loader.index_for(&key).index);
        }
        combined
    }

    /// One principal's explicit option map, legacy shapes migrated.
    fn explicit_options(&self, principal: &Principal, object: &ObjectRef) -> OptionMap {
        self.ctx
            .settings()
            .read(&principal.key(), object.kind.name(), &object.id)
            .map(normalize_map)
            .unwrap_or_default()
    }

    /// Walk ancestors nearest-first; the first one defining a key wins. At
    /// the role layer of a multi-role user, sibling-role maps are combined
    /// by the merge preference before the walk consumes the result.
    fn inherit(&self, principal: &Principal, object: &ObjectRef, resolved: &mut ResolvedMap) {
        let chain = self.ctx.hierarchy().ancestors(principal);
        let siblings = self.ctx.hierarchy().siblings(principal);

        for ancestor in chain.iter().skip(1) {
            let map = if matches!(ancestor, Principal::Role { .. }) && !siblings.is_empty() {
                let mut sources = vec![self.explicit_options(ancestor, object)];
                sources.extend(
                    siblings
                        .iter()
                        .map(|sibling| self.explicit_options(sibling, object)),
                );
                merge(&sources, self.ctx.config().merge_preference)
            } else {
                self.explicit_options(ancestor, object)
            };

            for (key, value) in map {
                resolved.insert_if_absent(key, ResolvedEntry::inherited(value));
            }
        }
    }

    /// Translate applicable statements and fill the remaining gaps.
    /// Explicit settings always beat policy for the same principal.
    fn apply_policies(&self, principal: &Principal, object: &ObjectRef, resolved: &mut ResolvedMap) {
        if !object.kind.is_builtin() {
            warn!(
                "Unknown object kind '{}', no policy translation applies",
                object.kind
            );
            return;
        }

        let loader = PolicyLoader::new(self.ctx.policies());
        let mut statement_maps = Vec::new();

        for key in self.source_keys(principal) {
            for mut outcome in loader.source_indexes(&key) {
                self.drop_unknown_capabilities(&mut outcome);
                for statement in outcome.index.find(object.kind.name()) {
                    let map = self.derive(statement, object);
                    if !map.is_empty() {
                        statement_maps.push(map);
                    }
                }
            }
        }

        let policy_map = merge(&statement_maps, self.ctx.config().merge_preference);
        for (key, value) in policy_map {
            if resolved.is_overwritten(&key) {
                continue;
            }
            resolved.insert_if_absent(key, ResolvedEntry::policy(value));
        }
    }

    /// The option contributions of one statement for one object.
    fn derive(&self, statement: &IndexedStatement, object: &ObjectRef) -> OptionMap {
        let mut out = OptionMap::new();

        for &(action, _) in mapping::actions_for(&object.kind) {
            let covered = if statement.actions.is_empty() {
                // The action rides in the pattern's final segment.
                statement.covers(&object.address(action))
            } else {
                statement
                    .actions
                    .iter()
                    .any(|a| a.eq_ignore_ascii_case(action))
                    && (statement.covers(&object.to_string())
                        || statement.covers(&object.address(action)))
            };

            if covered {
                for (key, value) in
                    mapping::translate(&object.kind, action, statement.effect, &statement.metadata)
                {
                    out.entry(key).or_insert(value);
                }
            }
        }

        out
    }

    /// Statement source order: the principal itself, sibling roles, then
    /// the ancestor chain. Doubles as the set of principals a cached result
    /// depends on.
    pub(crate) fn source_keys(&self, principal: &Principal) -> Vec<String> {
        let mut keys = vec![principal.key()];
        for sibling in self.ctx.hierarchy().siblings(principal) {
            keys.push(sibling.key());
        }
        for ancestor in self.ctx.hierarchy().ancestors(principal).iter().skip(1) {
            keys.push(ancestor.key());
        }
        keys
    }

    /// Statements restricting a capability the directory has never heard of
    /// are dropped before they can apply an effect.
    fn drop_unknown_capabilities(&self, outcome: &mut IndexOutcome) {
        let capabilities = self.ctx.capabilities();
        outcome.index.retain(|statement| {
            let mut segments = statement.pattern.split(':');
            let targets_capability = segments
                .next()
                .map(|t| t.eq_ignore_ascii_case("capability"))
                .unwrap_or(false);
            if !targets_capability {
                return true;
            }
            match segments.next() {
                Some(name) if capabilities.exists(name) => true,
                Some(name) => {
                    warn!("Dropping statement for unknown capability '{}'", name);
                    false
                }
                None => false,
            }
        });
    }

    fn apply_extensions(
        &self,
        principal: &Principal,
        object: &ObjectRef,
        resolved: &mut ResolvedMap,
    ) {
        for extension in self.ctx.extensions() {
            if let Some(map) = extension.on_resolve(principal, object) {
                debug!(
                    "Extension '{}' contributed {} option(s)",
                    extension.name(),
                    map.len()
                );
                for (key, value) in map {
                    resolved.insert_if_absent(key, ResolvedEntry::policy(value));
                }
            }
        }
    }
}
