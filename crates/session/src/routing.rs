#![forbid(unsafe_code)]

use rb_core::ids::RoadmapId;

/// Maps a URL fragment to the active roadmap id: `#/<id>` selects a
/// roadmap, anything else (including an id failing validation) falls
/// back to `"default"`.
pub fn resolve_fragment(fragment: &str) -> RoadmapId {
    let Some(raw) = fragment.strip_prefix("#/") else {
        return RoadmapId::default_id();
    };
    RoadmapId::try_new(raw).unwrap_or_else(|_| RoadmapId::default_id())
}

/// Inverse mapping used when navigating: the default roadmap clears
/// the fragment.
pub fn fragment_for(id: &RoadmapId) -> String {
    if id.is_default() {
        String::new()
    } else {
        format!("#/{id}")
    }
}

pub fn page_title(id: &RoadmapId) -> String {
    format!("ERBY: {id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_resolution() {
        assert_eq!(resolve_fragment("#/work").as_str(), "work");
        assert_eq!(resolve_fragment("").as_str(), "default");
        assert_eq!(resolve_fragment("#work").as_str(), "default");
        assert_eq!(resolve_fragment("#/").as_str(), "default");
        assert_eq!(resolve_fragment("#/bad id!").as_str(), "default");
    }

    #[test]
    fn fragment_roundtrip() {
        let work = RoadmapId::try_new("work").unwrap();
        assert_eq!(fragment_for(&work), "#/work");
        assert_eq!(resolve_fragment(&fragment_for(&work)), work);
        assert_eq!(fragment_for(&RoadmapId::default_id()), "");
        assert_eq!(page_title(&work), "ERBY: work");
    }
}
