use std::collections::BTreeMap;

/// Value of one fragment parameter; bare tokens are flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FragmentValue {
    Flag,
    Text(String),
}

/// Permalink state parsed once at startup from a `#v1,key:value,flag,...`
/// fragment. Unrecognized versions parse to an empty map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HashParams {
    params: BTreeMap<String, FragmentValue>,
}

impl HashParams {
    pub fn parse(fragment: &str) -> Self {
        let frag = fragment.strip_prefix('#').unwrap_or(fragment);
        let Some(rest) = frag.strip_prefix("v1,") else {
            return Self::default();
        };
        let mut params = BTreeMap::new();
        for part in rest.split(',') {
            if part.is_empty() {
                continue;
            }
            match part.split_once(':') {
                Some((key, value)) => {
                    params.insert(key.to_string(), FragmentValue::Text(value.to_string()));
                }
                None => {
                    params.insert(part.to_string(), FragmentValue::Flag);
                }
            }
        }
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&FragmentValue> {
        self.params.get(key)
    }

    /// Text value for `key`, if it was given as `key:value`.
    pub fn value(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(FragmentValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    /// True when `key` appeared as a bare token.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.params.get(key), Some(FragmentValue::Flag))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}
