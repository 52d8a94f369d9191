use std::collections::BTreeMap;

/// Source of variable and home-directory lookups used during expansion.
///
/// Production code reads the process environment through [`ProcessEnv`];
/// tests supply a [`StaticVars`] map so they never depend on (or mutate)
/// ambient process state.
pub trait VarSource {
    /// Value of the variable `name`, or `None` when unset.
    fn get(&self, name: &str) -> Option<String>;

    /// Home directory used for leading-tilde expansion.
    fn home(&self) -> Option<String> {
        self.get("HOME")
    }
}

/// Lookup backed by the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed variable map, for hermetic tests and scripted invocations.
#[derive(Debug, Clone, Default)]
pub struct StaticVars {
    vars: BTreeMap<String, String>,
}

impl StaticVars {
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl VarSource for StaticVars {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Recursive `$VAR` / `~` expansion over nested configuration values.
///
/// Containers keep their shape; only string leaves are rewritten. Variables
/// the source cannot resolve stay in place as literal text.
pub trait ExpandVars {
    #[must_use]
    fn expand_vars(&self, vars: &dyn VarSource) -> Self;
}

impl ExpandVars for String {
    fn expand_vars(&self, vars: &dyn VarSource) -> Self {
        // Two explicit steps, variables before the leading tilde: an expanded
        // variable may itself start with `~`, which the combined
        // `shellexpand::full_*` entry points deliberately leave unexpanded.
        let expanded = shellexpand::env_with_context_no_errors(self, |name| vars.get(name));
        shellexpand::tilde_with_context(expanded.as_ref(), || vars.home()).into_owned()
    }
}

impl<T: ExpandVars> ExpandVars for Option<T> {
    fn expand_vars(&self, vars: &dyn VarSource) -> Self {
        self.as_ref().map(|value| value.expand_vars(vars))
    }
}

impl<T: ExpandVars> ExpandVars for Vec<T> {
    fn expand_vars(&self, vars: &dyn VarSource) -> Self {
        self.iter().map(|value| value.expand_vars(vars)).collect()
    }
}

impl<V: ExpandVars> ExpandVars for BTreeMap<String, V> {
    fn expand_vars(&self, vars: &dyn VarSource) -> Self {
        // Keys are names, not paths; only values are rewritten.
        self.iter()
            .map(|(key, value)| (key.clone(), value.expand_vars(vars)))
            .collect()
    }
}

impl<A: ExpandVars, B: ExpandVars> ExpandVars for (A, B) {
    fn expand_vars(&self, vars: &dyn VarSource) -> Self {
        (self.0.expand_vars(vars), self.1.expand_vars(vars))
    }
}
