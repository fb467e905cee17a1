//! End-to-end scenarios against two real [`rdt::Rdt`] endpoints over
//! loopback UDP.

use std::time::Duration;

use async_std::{future::timeout, task};
use rdt::{Rdt, RdtConfig};

fn loopback() -> std::net::SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn recv_all(endpoint: &Rdt, count: usize) -> Vec<String> {
    let mut received = Vec::with_capacity(count);
    for _ in 0..count {
        let payload = timeout(Duration::from_secs(10), endpoint.receive())
            .await
            .expect("timed out waiting for a payload")
            .expect("channel closed early");
        received.push(payload);
    }
    received
}

#[test]
fn test_clean_channel_delivers_in_order() {
    task::block_on(async {
        let b = Rdt::bind(loopback(), RdtConfig::new(4, Duration::from_millis(500)))
            .await
            .unwrap();
        let b_addr = b.local_addr();

        // B learns A's address from the first datagram it receives; A is
        // given B's address up front so it can start sending immediately.
        let a = Rdt::bind(
            loopback(),
            RdtConfig::new(4, Duration::from_millis(500)).with_peer(b_addr),
        )
        .await
        .unwrap();

        let payloads: Vec<String> = (0..10).map(|n| format!("testing {n}")).collect();
        for payload in &payloads {
            a.send(payload.clone()).await;
        }

        let received = recv_all(&b, 10).await;
        assert_eq!(received, payloads);

        a.stop().await;
        b.stop().await;
    });
}

#[test]
fn test_lossy_channel_still_delivers_everything() {
    task::block_on(async {
        let b = Rdt::bind(loopback(), RdtConfig::new(4, Duration::from_millis(200)))
            .await
            .unwrap();
        let b_addr = b.local_addr();

        let a = Rdt::bind(
            loopback(),
            RdtConfig::new(4, Duration::from_millis(200))
                .with_disc_prob(0.3)
                .with_peer(b_addr),
        )
        .await
        .unwrap();

        let payloads: Vec<String> = (0..10).map(|n| format!("testing {n}")).collect();
        for payload in &payloads {
            a.send(payload.clone()).await;
        }

        let received = recv_all(&b, 10).await;
        assert_eq!(received, payloads);

        a.stop().await;
        b.stop().await;
    });
}

#[test]
fn test_sequence_wraparound_delivers_everything() {
    task::block_on(async {
        let b = Rdt::bind(loopback(), RdtConfig::new(3, Duration::from_millis(200)))
            .await
            .unwrap();
        let b_addr = b.local_addr();

        let a = Rdt::bind(
            loopback(),
            RdtConfig::new(3, Duration::from_millis(200)).with_peer(b_addr),
        )
        .await
        .unwrap();

        let payloads: Vec<String> = (0..20).map(|n| format!("testing {n}")).collect();
        for payload in &payloads {
            a.send(payload.clone()).await;
        }

        let received = recv_all(&b, 20).await;
        assert_eq!(received, payloads);

        a.stop().await;
        b.stop().await;
    });
}
