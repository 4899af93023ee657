//! Mirroring the session into the visible address.

use url::Url;

use crate::Result;

/// Host hook that replaces the visible address in place, without pushing a
/// navigation history entry.
pub trait AddressMirror: Send {
    fn replace(&mut self, address: &str);
}

impl<F> AddressMirror for F
where
    F: FnMut(&str) + Send,
{
    fn replace(&mut self, address: &str) {
        self(address)
    }
}

/// Reads the persisted query from an address. Empty values count as absent.
pub fn query_from_address(address: &str, param: &str) -> Result<Option<String>> {
    let url = Url::parse(address)?;
    Ok(url
        .query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty()))
}

/// Rewrites `address` so it carries the query and active engine. Unrelated
/// parameters are kept in order; an empty query drops the query parameter.
pub fn mirror_address(
    address: &str,
    query_param: &str,
    query: &str,
    engine_param: &str,
    engine: &str,
) -> Result<String> {
    let mut url = Url::parse(address)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != query_param && key != engine_param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        if !query.is_empty() {
            pairs.append_pair(query_param, query);
        }
        pairs.append_pair(engine_param, engine);
    }

    Ok(url.to_string())
}
