//! Reference dereferencing, one RPC per hop.
//!
//! Children are fetched strictly in declaration order and the output keeps
//! that order. A reference that no longer resolves fails the whole walk with
//! [`ScopeError::StaleReference`]; callers never see a partial list.

use super::Entity;
use crate::client::IntrospectionClient;
use crate::error::EntityKind;
use crate::{Result, ScopeError};
use grpcscope_proto::{Channel, Server, Socket, SocketRef, Subchannel};
use std::collections::HashSet;
use tracing::debug;

fn stale(kind: EntityKind, id: i64, parent: &str) -> ScopeError {
    ScopeError::StaleReference {
        kind,
        id,
        parent: parent.to_string(),
    }
}

async fn dereference_sockets<C>(
    client: &C,
    refs: &[SocketRef],
    parent: &str,
) -> Result<Vec<Socket>>
where
    C: IntrospectionClient + ?Sized,
{
    let mut sockets = Vec::with_capacity(refs.len());
    for socket_ref in refs {
        let socket = client
            .fetch_socket(socket_ref.socket_id)
            .await?
            .ok_or_else(|| stale(EntityKind::Socket, socket_ref.socket_id, parent))?;
        sockets.push(socket);
    }
    Ok(sockets)
}

/// The subchannels a channel declares.
pub async fn expand_channel<C>(client: &C, channel: &Channel) -> Result<Vec<Subchannel>>
where
    C: IntrospectionClient + ?Sized,
{
    let parent = format!("channel {}", channel.id());
    debug!(%parent, refs = channel.subchannel_ref.len(), "Expanding subchannels");

    let mut subchannels = Vec::with_capacity(channel.subchannel_ref.len());
    for subchannel_ref in &channel.subchannel_ref {
        let id = subchannel_ref.subchannel_id;
        subchannels.push(dereference_subchannel(client, id, &parent).await?);
    }
    Ok(subchannels)
}

async fn dereference_subchannel<C>(client: &C, id: i64, parent: &str) -> Result<Subchannel>
where
    C: IntrospectionClient + ?Sized,
{
    client
        .fetch_subchannel(id)
        .await?
        .ok_or_else(|| stale(EntityKind::Subchannel, id, parent))
}

/// The sockets a subchannel declares.
pub async fn expand_subchannel<C>(client: &C, subchannel: &Subchannel) -> Result<Vec<Socket>>
where
    C: IntrospectionClient + ?Sized,
{
    let parent = format!("subchannel {}", subchannel.id());
    debug!(%parent, refs = subchannel.socket_ref.len(), "Expanding sockets");
    dereference_sockets(client, &subchannel.socket_ref, &parent).await
}

/// The sockets a server has accepted, listed through the server-sockets RPC.
pub async fn expand_server<C>(client: &C, server: &Server) -> Result<Vec<Socket>>
where
    C: IntrospectionClient + ?Sized,
{
    let parent = format!("server {}", server.id());
    let refs = client.list_server_socket_refs(server.id()).await?;
    debug!(%parent, refs = refs.len(), "Expanding accepted sockets");
    dereference_sockets(client, &refs, &parent).await
}

/// The listening sockets a server declares.
pub async fn listen_sockets<C>(client: &C, server: &Server) -> Result<Vec<Socket>>
where
    C: IntrospectionClient + ?Sized,
{
    let parent = format!("server {}", server.id());
    dereference_sockets(client, &server.listen_socket, &parent).await
}

/// Every subchannel of every top channel, channel by channel. A subchannel
/// shared by several channels is fetched and listed once, where first seen.
pub async fn all_subchannels<C>(client: &C) -> Result<Vec<Subchannel>>
where
    C: IntrospectionClient + ?Sized,
{
    let mut seen = HashSet::new();
    let mut subchannels = Vec::new();
    for channel in client.list_top_channels().await? {
        let parent = format!("channel {}", channel.id());
        for subchannel_ref in &channel.subchannel_ref {
            let id = subchannel_ref.subchannel_id;
            if seen.insert(id) {
                subchannels.push(dereference_subchannel(client, id, &parent).await?);
            }
        }
    }
    Ok(subchannels)
}

/// Fetch a socket named directly by the operator. Sockets are only ever
/// addressed by ID.
pub async fn fetch_socket<C>(client: &C, token: &str) -> Result<Socket>
where
    C: IntrospectionClient + ?Sized,
{
    let not_found = || ScopeError::not_found(EntityKind::Socket, token);
    let id = token.parse::<i64>().map_err(|_| not_found())?;
    client.fetch_socket(id).await?.ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::{Call, MemoryIntrospector};
    use grpcscope_proto::{ChannelRef, ServerRef, SubchannelRef};

    fn subchannel(id: i64, sockets: &[i64]) -> Subchannel {
        Subchannel {
            r#ref: Some(SubchannelRef {
                subchannel_id: id,
                name: String::new(),
            }),
            socket_ref: sockets
                .iter()
                .map(|&socket_id| SocketRef {
                    socket_id,
                    name: String::new(),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn socket(id: i64) -> Socket {
        Socket {
            r#ref: Some(SocketRef {
                socket_id: id,
                name: String::new(),
            }),
            ..Default::default()
        }
    }

    fn channel(id: i64, subchannels: &[i64]) -> Channel {
        Channel {
            r#ref: Some(ChannelRef {
                channel_id: id,
                name: String::new(),
            }),
            subchannel_ref: subchannels
                .iter()
                .map(|&subchannel_id| SubchannelRef {
                    subchannel_id,
                    name: String::new(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_expand_channel_keeps_declaration_order() {
        let client = MemoryIntrospector::new()
            .with_subchannel(subchannel(9, &[]))
            .with_subchannel(subchannel(5, &[]));

        let subchannels = expand_channel(&client, &channel(1, &[5, 9])).await.unwrap();

        let ids: Vec<i64> = subchannels.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![5, 9]);
        assert_eq!(
            client.calls(),
            vec![Call::FetchSubchannel(5), Call::FetchSubchannel(9)]
        );
    }

    #[tokio::test]
    async fn test_expand_channel_stale_reference_fails_whole_walk() {
        let client = MemoryIntrospector::new().with_subchannel(subchannel(5, &[]));

        let err = expand_channel(&client, &channel(1, &[5, 9]))
            .await
            .unwrap_err();

        match err {
            ScopeError::StaleReference { kind, id, parent } => {
                assert_eq!(kind, EntityKind::Subchannel);
                assert_eq!(id, 9);
                assert_eq!(parent, "channel 1");
            }
            other => panic!("expected stale reference, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_expand_subchannel_fetches_each_socket() {
        let client = MemoryIntrospector::new()
            .with_socket(socket(21))
            .with_socket(socket(20));

        let sockets = expand_subchannel(&client, &subchannel(5, &[21, 20]))
            .await
            .unwrap();

        let ids: Vec<i64> = sockets.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![21, 20]);
    }

    #[tokio::test]
    async fn test_expand_server_lists_then_dereferences() {
        let server = Server {
            r#ref: Some(ServerRef {
                server_id: 2,
                name: String::new(),
            }),
            ..Default::default()
        };
        let client = MemoryIntrospector::new()
            .with_server_socket(2, 31)
            .with_server_socket(2, 30)
            .with_socket(socket(30))
            .with_socket(socket(31));

        let sockets = expand_server(&client, &server).await.unwrap();

        assert_eq!(sockets.len(), 2);
        assert_eq!(
            client.calls(),
            vec![
                Call::ListServerSocketRefs(2),
                Call::FetchSocket(31),
                Call::FetchSocket(30),
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let client = MemoryIntrospector::new()
            .with_socket(socket(20))
            .with_unreachable_socket(21);

        let err = expand_subchannel(&client, &subchannel(5, &[20, 21]))
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::Transport(_)));
    }

    #[tokio::test]
    async fn test_all_subchannels_walks_every_channel() {
        let client = MemoryIntrospector::new()
            .with_channel(channel(1, &[7]))
            .with_channel(channel(2, &[3, 4]))
            .with_subchannel(subchannel(3, &[]))
            .with_subchannel(subchannel(4, &[]))
            .with_subchannel(subchannel(7, &[]));

        let ids: Vec<i64> = all_subchannels(&client)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(ids, vec![7, 3, 4]);
    }

    #[tokio::test]
    async fn test_all_subchannels_lists_shared_subchannel_once() {
        let client = MemoryIntrospector::new()
            .with_channel(channel(1, &[3, 4]))
            .with_channel(channel(2, &[4, 5]))
            .with_subchannel(subchannel(3, &[]))
            .with_subchannel(subchannel(4, &[]))
            .with_subchannel(subchannel(5, &[]));

        let ids: Vec<i64> = all_subchannels(&client)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert_eq!(
            client.calls(),
            vec![
                Call::ListTopChannels,
                Call::FetchSubchannel(3),
                Call::FetchSubchannel(4),
                Call::FetchSubchannel(5),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_socket_by_token() {
        let client = MemoryIntrospector::new().with_socket(socket(12));

        assert_eq!(fetch_socket(&client, "12").await.unwrap().id(), 12);
        assert!(matches!(
            fetch_socket(&client, "13").await,
            Err(ScopeError::NotFound { .. })
        ));
        assert!(matches!(
            fetch_socket(&client, "socket-12").await,
            Err(ScopeError::NotFound { .. })
        ));
        // A non-numeric token never reaches the remote.
        assert_eq!(client.calls(), vec![Call::FetchSocket(12), Call::FetchSocket(13)]);
    }
}
