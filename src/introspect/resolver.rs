//! Operator token to entity resolution.
//!
//! A token that parses as a base-10 integer selects by ID; anything else is
//! matched against target strings. Targets are not unique, so a target that
//! names more than one candidate is reported as ambiguous rather than
//! resolved to whichever came first.

use super::Entity;
use crate::{Result, ScopeError};

pub fn resolve<T: Entity>(token: &str, candidates: Vec<T>) -> Result<T> {
    let selected = match token.parse::<i64>() {
        Ok(id) => candidates.into_iter().find(|c| c.id() == id),
        Err(_) => {
            let mut selected = None;
            for candidate in candidates {
                if candidate.target() != Some(token) {
                    continue;
                }
                if selected.is_some() {
                    return Err(ScopeError::Ambiguous {
                        kind: T::KIND,
                        token: token.to_string(),
                    });
                }
                selected = Some(candidate);
            }
            selected
        }
    };

    selected.ok_or_else(|| ScopeError::not_found(T::KIND, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;
    use grpcscope_proto::{Channel, ChannelData, ChannelRef, Server, ServerRef};

    fn channel(id: i64, target: &str) -> Channel {
        Channel {
            r#ref: Some(ChannelRef {
                channel_id: id,
                name: String::new(),
            }),
            data: Some(ChannelData {
                target: target.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn candidates() -> Vec<Channel> {
        vec![
            channel(3, "dns:///shop.internal:443"),
            channel(1, "dns:///auth.internal:443"),
            channel(8, "dns:///shop.internal:443"),
            channel(5, "localhost:50051"),
        ]
    }

    #[test]
    fn test_resolve_by_id_ignores_order() {
        for id in [3, 1, 8, 5] {
            let mut list = candidates();
            assert_eq!(resolve(&id.to_string(), list.clone()).unwrap().id(), id);
            list.reverse();
            assert_eq!(resolve(&id.to_string(), list).unwrap().id(), id);
        }
    }

    #[test]
    fn test_resolve_by_unique_target() {
        let found = resolve("localhost:50051", candidates()).unwrap();
        assert_eq!(found.id(), 5);
    }

    #[test]
    fn test_resolve_shared_target_is_ambiguous() {
        let err = resolve("dns:///shop.internal:443", candidates()).unwrap_err();
        match err {
            ScopeError::Ambiguous { kind, token } => {
                assert_eq!(kind, EntityKind::Channel);
                assert_eq!(token, "dns:///shop.internal:443");
            }
            other => panic!("expected ambiguity, got {other}"),
        }
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        assert!(matches!(
            resolve("42", candidates()),
            Err(ScopeError::NotFound { .. })
        ));
        assert!(matches!(
            resolve("nowhere:1", candidates()),
            Err(ScopeError::NotFound { .. })
        ));
        assert!(matches!(
            resolve("1", Vec::<Channel>::new()),
            Err(ScopeError::NotFound { .. })
        ));
    }

    #[test]
    fn test_numeric_target_is_looked_up_as_id() {
        // "5" is an ID, even if some target happened to be the string "5".
        let list = vec![channel(9, "5"), channel(5, "localhost:50051")];
        assert_eq!(resolve("5", list).unwrap().id(), 5);
    }

    #[test]
    fn test_server_has_no_target() {
        let servers = vec![Server {
            r#ref: Some(ServerRef {
                server_id: 2,
                name: String::new(),
            }),
            ..Default::default()
        }];
        assert_eq!(resolve("2", servers.clone()).unwrap().id(), 2);
        assert!(matches!(
            resolve("localhost:50051", servers),
            Err(ScopeError::NotFound {
                kind: EntityKind::Server,
                ..
            })
        ));
    }
}
