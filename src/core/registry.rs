use std::borrow::Cow;
use std::collections::BTreeMap;

use super::command::{CommandDefinition, CommandList};
use super::status::{CommandObjectData, DispatchError};

/// Canonical command definitions keyed by identifier.
///
/// Mutation must not overlap with a dispatch; callers serialize access.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandDefinition>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_list(list: CommandList) -> Self {
        let mut reg = Self::new();
        reg.merge(list);
        reg
    }

    /// Replace the whole registry.
    pub fn set_command_list(&mut self, list: CommandList) {
        self.commands.clear();
        self.merge(list);
    }

    /// Merge a table in; definitions with an existing identifier are replaced.
    pub fn merge(&mut self, list: CommandList) {
        for (identifier, mut def) in list.commands {
            def.identifier = identifier;
            self.add(def);
        }
    }

    pub fn add(&mut self, definition: CommandDefinition) {
        if definition.overloads.is_empty() {
            log::warn!(
                "command '{}' registered without overloads; dispatching it will fail",
                definition.identifier
            );
        }
        log::debug!("registered command '{}'", definition.identifier);
        self.commands.insert(definition.identifier.clone(), definition);
    }

    pub fn remove(&mut self, identifier: &str) -> Option<CommandDefinition> {
        self.commands.remove(identifier)
    }

    /// Canonical lookup, without alias expansion.
    pub fn get(&self, identifier: &str) -> Option<&CommandDefinition> {
        self.commands.get(identifier)
    }

    pub fn get_mut(&mut self, identifier: &str) -> Option<&mut CommandDefinition> {
        self.commands.get_mut(identifier)
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn to_command_list(&self) -> CommandList {
        CommandList {
            commands: self.commands.clone(),
        }
    }

    /// Fresh, empty context object for callbacks that replace the context.
    pub fn create_command_object_data(&self, identifier: &str) -> CommandObjectData {
        CommandObjectData::new(identifier)
    }

    /// Canonical commands plus one copy per alias, rebuilt from the current
    /// state on every call. An alias that collides with another identifier
    /// wins over it; the collision is logged.
    pub fn alias_expanded(&self) -> BTreeMap<String, CommandDefinition> {
        let mut expanded = self.commands.clone();
        for def in self.commands.values() {
            for alias in &def.aliases {
                if let Some(existing) = expanded.get(alias) {
                    log::warn!(
                        "alias '{}' of command '{}' overrides existing command '{}'",
                        alias,
                        def.identifier,
                        existing.identifier
                    );
                }
                expanded.insert(alias.clone(), def.alias_copy(alias));
            }
        }
        expanded
    }

    /// Alias-aware lookup used by dispatch. Agrees with [`alias_expanded`]:
    /// the last command (in identifier order) that lists `identifier` as an
    /// alias wins, then the canonical entry.
    ///
    /// [`alias_expanded`]: Self::alias_expanded
    pub fn resolve(&self, identifier: &str) -> Result<Cow<'_, CommandDefinition>, DispatchError> {
        let mut alias_owner: Option<&CommandDefinition> = None;
        for def in self.commands.values() {
            if def.aliases.iter().any(|alias| alias == identifier) {
                if let Some(previous) = alias_owner.replace(def) {
                    log::warn!(
                        "alias '{}' of command '{}' overrides the same alias of '{}'",
                        identifier,
                        def.identifier,
                        previous.identifier
                    );
                }
            }
        }

        match (alias_owner, self.commands.get(identifier)) {
            (Some(owner), canonical) => {
                if let Some(existing) = canonical {
                    log::warn!(
                        "alias '{}' of command '{}' overrides existing command '{}'",
                        identifier,
                        owner.identifier,
                        existing.identifier
                    );
                }
                Ok(Cow::Owned(owner.alias_copy(identifier)))
            }
            (None, Some(canonical)) => Ok(Cow::Borrowed(canonical)),
            (None, None) => Err(DispatchError::CommandNotFound {
                name: identifier.to_string(),
            }),
        }
    }
}

/// Named command tables that can be combined into one registry load.
#[derive(Debug, Clone, Default)]
pub struct CommandQuery {
    sets: BTreeMap<String, CommandList>,
}

impl CommandQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a named set; empty tables are ignored.
    pub fn set(&mut self, name: &str, commands: CommandList) {
        if !commands.is_empty() {
            self.sets.insert(name.to_string(), commands);
        }
    }

    /// Merge commands into an existing set. Returns false when no such set exists.
    pub fn assign(&mut self, name: &str, commands: CommandList) -> bool {
        match self.sets.get_mut(name) {
            Some(set) => {
                set.commands.extend(commands.commands);
                true
            }
            None => false,
        }
    }

    pub fn remove_command(&mut self, name: &str, identifier: &str) -> Option<CommandDefinition> {
        self.sets.get_mut(name)?.commands.remove(identifier)
    }

    pub fn get(&self, name: &str) -> Option<&CommandList> {
        self.sets.get(name)
    }

    /// Merge the named sets in order; later sets win. Unknown names are skipped.
    pub fn combine(&self, names: &[&str]) -> CommandList {
        let mut combined = CommandList::new();
        for name in names {
            match self.sets.get(*name) {
                Some(set) => combined.commands.extend(set.commands.clone()),
                None => log::warn!("command set '{}' does not exist", name),
            }
        }
        combined
    }

    pub fn remove(&mut self, name: &str) -> Option<CommandList> {
        self.sets.remove(name)
    }

    pub fn reset(&mut self) {
        self.sets.clear();
    }

    pub fn names(&self) -> Vec<&str> {
        self.sets.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{ArgumentSpec, OverloadDefinition};

    fn command(identifier: &str, aliases: &[&str]) -> CommandDefinition {
        let mut def = CommandDefinition::new(identifier);
        def.set_description(format!("{} command", identifier))
            .set_aliases(aliases.iter().copied())
            .set_input_arguments("default", vec![ArgumentSpec::new("x", "float")]);
        def
    }

    fn list(defs: Vec<CommandDefinition>) -> CommandList {
        let mut list = CommandList::new();
        for def in defs {
            list.insert(def);
        }
        list
    }

    #[test]
    fn test_resolve_canonical_and_aliases() {
        let reg = CommandRegistry::from_list(list(vec![command("teleport", &["tp", "warp"])]));

        let canonical = reg.resolve("teleport").unwrap();
        assert_eq!(canonical.aliases, vec!["tp", "warp"]);

        for alias in ["tp", "warp"] {
            let def = reg.resolve(alias).unwrap();
            assert_eq!(def.identifier, alias);
            assert!(def.aliases.is_empty());
            assert_eq!(def.description, canonical.description);
            assert_eq!(def.overload_names(), canonical.overload_names());
            assert_eq!(
                def.overload("default").unwrap().input,
                canonical.overload("default").unwrap().input
            );
        }
    }

    #[test]
    fn test_resolve_unknown() {
        let reg = CommandRegistry::new();
        let err = reg.resolve("").unwrap_err();
        assert_eq!(err.kind(), "command_not_found");
    }

    #[test]
    fn test_aliases_follow_registry_changes() {
        let mut reg = CommandRegistry::from_list(list(vec![command("teleport", &["tp"])]));
        assert!(reg.resolve("tp").is_ok());

        reg.get_mut("teleport").unwrap().aliases = vec!["go".to_string()];
        assert!(reg.resolve("tp").is_err());
        assert!(reg.resolve("go").is_ok());

        reg.remove("teleport");
        assert!(reg.resolve("go").is_err());
    }

    #[test]
    fn test_aliases_not_transitive() {
        let reg = CommandRegistry::from_list(list(vec![
            command("a", &["b"]),
            command("c", &["a"]),
        ]));
        // "b" copies the canonical "a", not c's alias copy named "a"
        assert_eq!(reg.resolve("b").unwrap().description.as_deref(), Some("a command"));
        assert_eq!(reg.resolve("a").unwrap().description.as_deref(), Some("c command"));
    }

    #[test]
    fn test_resolve_matches_expanded_view() {
        let reg = CommandRegistry::from_list(list(vec![
            command("alpha", &["shared"]),
            command("beta", &["shared", "alpha"]),
            command("gamma", &["g"]),
        ]));
        let expanded = reg.alias_expanded();
        for id in ["alpha", "beta", "gamma", "shared", "g"] {
            let resolved = reg.resolve(id).unwrap();
            let expected = &expanded[id];
            assert_eq!(resolved.identifier, expected.identifier);
            assert_eq!(resolved.description, expected.description, "{id}");
            assert_eq!(resolved.aliases, expected.aliases, "{id}");
        }
        assert!(reg.resolve("missing").is_err());
    }

    #[test]
    fn test_canonical_resolve_borrows() {
        let reg = CommandRegistry::from_list(list(vec![command("teleport", &["tp"])]));
        assert!(matches!(reg.resolve("teleport").unwrap(), Cow::Borrowed(_)));
        assert!(matches!(reg.resolve("tp").unwrap(), Cow::Owned(_)));
    }

    #[test]
    fn test_expansion_leaves_canonical_untouched() {
        let reg = CommandRegistry::from_list(list(vec![command("teleport", &["tp"])]));
        let _ = reg.alias_expanded();
        assert_eq!(reg.identifiers(), vec!["teleport"]);
    }

    #[test]
    fn test_set_command_list_replaces() {
        let mut reg = CommandRegistry::from_list(list(vec![command("one", &[])]));
        reg.set_command_list(list(vec![command("two", &[])]));
        assert_eq!(reg.identifiers(), vec!["two"]);

        reg.merge(list(vec![command("three", &[])]));
        assert_eq!(reg.identifiers(), vec!["three", "two"]);
    }

    #[test]
    fn test_definition_without_overloads_is_kept() {
        let mut reg = CommandRegistry::new();
        reg.add(CommandDefinition::new("empty"));
        assert!(reg.get("empty").unwrap().overloads.is_empty());
    }

    #[test]
    fn test_command_query_combine() {
        let mut query = CommandQuery::new();
        query.set("base", list(vec![command("one", &[]), command("two", &[])]));
        query.set("extra", list(vec![command("three", &[])]));
        query.set("empty", CommandList::new());
        assert_eq!(query.names(), vec!["base", "extra"]);

        assert!(query.assign("extra", list(vec![command("four", &[])])));
        assert!(!query.assign("missing", list(vec![command("five", &[])])));
        assert!(query.remove_command("base", "two").is_some());

        let combined = query.combine(&["base", "extra", "missing"]);
        let names: Vec<&str> = combined.commands.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["four", "one", "three"]);

        query.remove("extra");
        assert!(query.get("extra").is_none());
        query.reset();
        assert!(query.names().is_empty());
    }

    #[test]
    fn test_create_command_object_data() {
        let mut def = CommandDefinition::new("x");
        def.set_overload("default", OverloadDefinition::new());
        let reg = CommandRegistry::from_list(list(vec![def]));
        let object = reg.create_command_object_data("x");
        assert_eq!(object.identifier, "x");
        assert!(object.data.is_empty());
    }
}
