use crate::AvlTree;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::Formatter;
use std::marker::PhantomData;

impl<K, V> Serialize for AvlTree<K, V>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct MapVisitor<K, V> {
    marker: PhantomData<fn() -> AvlTree<K, V>>,
}

impl<'de, K, V> Visitor<'de> for MapVisitor<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    type Value = AvlTree<K, V>;

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str("avl_kv::AvlTree")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut t = AvlTree::new();
        while let Some((k, v)) = access.next_entry()? {
            t.insert(k, v).map_err(serde::de::Error::custom)?;
        }
        Ok(t)
    }
}

impl<'de, K, V> Deserialize<'de> for AvlTree<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MapVisitor {
            marker: PhantomData,
        })
    }
}
