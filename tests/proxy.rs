use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use stdproxy::auth::reply::{AuthReply, AuthStatus};
use stdproxy::conn::reply::{ConnReply, Rep};
use stdproxy::error::SocksError;
use stdproxy::msg::message::MethodSelection;
use stdproxy::msg::method::Method;
use stdproxy::parse::{AddrPort, Parse};
use stdproxy::{Credentials, Direction, Socks5Connector, relay};
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
use tokio::net::{TcpListener, TcpStream};
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Clone)]
enum Mode {
    NoAuth,
    UserPass(&'static str, &'static str),
    RejectConnect(Rep),
    Silent,
}

/// Single-connection SOCKS5 proxy that relays CONNECT to IPv4 targets.
async fn spawn_proxy(mode: Mode) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut client, _) = listener.accept().await.unwrap();

        if let Mode::Silent = mode {
            let mut sink = Vec::new();
            let _ = client.read_to_end(&mut sink).await;
            return;
        }

        let mut head = [0u8; 2];
        client.read_exact(&mut head).await.unwrap();
        let mut methods = vec![0u8; head[1] as usize];
        client.read_exact(&mut methods).await.unwrap();

        match mode {
            Mode::UserPass(user, pass) => {
                assert!(methods.contains(&0x02));
                client
                    .write_all(&MethodSelection::new(Method::USER_PASS).to_bytes())
                    .await
                    .unwrap();

                let mut ver_ulen = [0u8; 2];
                client.read_exact(&mut ver_ulen).await.unwrap();
                let mut uname = vec![0u8; ver_ulen[1] as usize];
                client.read_exact(&mut uname).await.unwrap();
                let plen = client.read_u8().await.unwrap();
                let mut passwd = vec![0u8; plen as usize];
                client.read_exact(&mut passwd).await.unwrap();

                let ok = uname == user.as_bytes() && passwd == pass.as_bytes();
                let status = if ok { AuthStatus::Success } else { AuthStatus::Failure };
                client.write_all(&AuthReply::new(status).to_bytes()).await.unwrap();
                if !ok {
                    return;
                }
            }
            _ => {
                client
                    .write_all(&MethodSelection::new(Method::NO_AUTH).to_bytes())
                    .await
                    .unwrap();
            }
        }

        let mut header = [0u8; 4];
        client.read_exact(&mut header).await.unwrap();
        assert_eq!(header[..3], [0x05, 0x01, 0x00]);
        assert_eq!(header[3], 0x01, "tests only use IPv4 targets");
        let mut raw = [0u8; 6];
        client.read_exact(&mut raw).await.unwrap();
        let (target, _) = Parse::parse_ip_port(&raw, 0x01).unwrap();

        let unspecified = AddrPort::V4(Ipv4Addr::UNSPECIFIED, 0);
        if let Mode::RejectConnect(rep) = mode {
            client
                .write_all(&ConnReply::new(rep, unspecified).to_bytes())
                .await
                .unwrap();
            return;
        }

        let mut upstream = TcpStream::connect(target.to_string()).await.unwrap();
        let bnd = match upstream.local_addr().unwrap() {
            SocketAddr::V4(a) => AddrPort::V4(*a.ip(), a.port()),
            SocketAddr::V6(a) => AddrPort::V6(*a.ip(), a.port()),
        };
        client
            .write_all(&ConnReply::new(Rep::Succeeded, bnd).to_bytes())
            .await
            .unwrap();

        let _ = tokio::io::copy_bidirectional(&mut client, &mut upstream).await;
    });

    addr
}

/// Answers `pong\n` to `ping\n`, then closes.
async fn spawn_ping_pong() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut ping = [0u8; 5];
        stream.read_exact(&mut ping).await.unwrap();
        assert_eq!(&ping, b"ping\n");
        stream.write_all(b"pong\n").await.unwrap();
        stream.shutdown().await.unwrap();
    });

    addr
}

async fn spawn_echo() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (mut r, mut w) = stream.into_split();
        let _ = tokio::io::copy(&mut r, &mut w).await;
        let _ = w.shutdown().await;
    });

    addr
}

#[tokio::test]
async fn ping_pong_through_proxy_without_auth() {
    let proxy = spawn_proxy(Mode::NoAuth).await;
    let dest = spawn_ping_pong().await;

    let conn = Socks5Connector::new(proxy.to_string())
        .with_timeout(Duration::from_secs(5))
        .connect(&dest.to_string())
        .await
        .unwrap();

    let sock = socket2::SockRef::from(&conn);
    assert!(sock.keepalive().unwrap());
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    assert_eq!(sock.keepalive_time().unwrap(), stdproxy::KEEP_ALIVE);

    let (mut stdin_w, stdin_r) = duplex(1024);
    let (stdout_w, mut stdout_r) = duplex(1024);
    let session = tokio::spawn(relay::run(conn, stdin_r, stdout_w));

    stdin_w.write_all(b"ping\n").await.unwrap();

    let mut output = Vec::new();
    stdout_r.read_to_end(&mut output).await.unwrap();
    assert_eq!(output, b"pong\n");
    drop(stdin_w);

    let result = session.await.unwrap();
    assert_eq!(result.received(), 5);
    assert_eq!(result.sent(), 5);
    assert_eq!(result.first_closed, Direction::RemoteToLocal);
}

#[tokio::test]
async fn binary_closes_stdout_when_remote_hangs_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dest = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"x").await.unwrap();
        stream.shutdown().await.unwrap();
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest).await;
    });
    let proxy = spawn_proxy(Mode::NoAuth).await;

    let mut child = Command::new(env!("CARGO_BIN_EXE_stdproxy"))
        .arg(proxy.to_string())
        .arg("127.0.0.1")
        .arg(dest.port().to_string())
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .unwrap();

    // stdin stays open while stdout is drained.
    let stdin = child.stdin.take().unwrap();
    let mut stdout = child.stdout.take().unwrap();

    let mut output = Vec::new();
    timeout(Duration::from_secs(5), stdout.read_to_end(&mut output))
        .await
        .expect("stdout should reach EOF after the destination hangs up")
        .unwrap();
    assert_eq!(output, b"x");

    drop(stdin);
    let status = timeout(Duration::from_secs(5), child.wait())
        .await
        .expect("process should exit once stdin closes")
        .unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn echo_through_authenticated_proxy() {
    let proxy = spawn_proxy(Mode::UserPass("alice", "wonderland")).await;
    let dest = spawn_echo().await;
    let creds: Credentials = "alice:wonderland".parse().unwrap();

    let conn = Socks5Connector::new(proxy.to_string())
        .with_timeout(Duration::from_secs(5))
        .with_credentials(Some(creds))
        .connect(&dest.to_string())
        .await
        .unwrap();

    let (mut stdin_w, stdin_r) = duplex(1024);
    let (stdout_w, mut stdout_r) = duplex(1024);
    let session = tokio::spawn(relay::run(conn, stdin_r, stdout_w));

    stdin_w.write_all(b"\x00binary\xffsafe\n").await.unwrap();
    let mut echoed = [0u8; 13];
    stdout_r.read_exact(&mut echoed).await.unwrap();
    assert_eq!(&echoed, b"\x00binary\xffsafe\n");

    drop(stdin_w);
    let mut rest = Vec::new();
    stdout_r.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());

    let result = session.await.unwrap();
    assert_eq!(result.sent(), 13);
    assert_eq!(result.received(), 13);
    assert_eq!(result.first_closed, Direction::LocalToRemote);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let proxy = spawn_proxy(Mode::UserPass("alice", "wonderland")).await;
    let creds = Credentials::new("alice", "guess").unwrap();

    let err = Socks5Connector::new(proxy.to_string())
        .with_timeout(Duration::from_secs(5))
        .with_credentials(Some(creds))
        .connect("127.0.0.1:9")
        .await
        .unwrap_err();

    assert!(matches!(err, SocksError::AuthFailed(_)), "{err}");
}

#[tokio::test]
async fn rejected_connect_is_reported() {
    let proxy = spawn_proxy(Mode::RejectConnect(Rep::ConnectionNotAllowed)).await;

    let err = Socks5Connector::new(proxy.to_string())
        .with_timeout(Duration::from_secs(5))
        .connect("127.0.0.1:9")
        .await
        .unwrap_err();

    assert!(matches!(err, SocksError::ConnectRejected(Rep::ConnectionNotAllowed)), "{err}");
}

#[tokio::test]
async fn stalled_handshake_times_out() {
    let proxy = spawn_proxy(Mode::Silent).await;
    let timeout = Duration::from_millis(200);

    let err = Socks5Connector::new(proxy.to_string())
        .with_timeout(timeout)
        .connect("127.0.0.1:9")
        .await
        .unwrap_err();

    assert!(matches!(err, SocksError::Timeout(t) if t == timeout), "{err}");
}

#[tokio::test]
async fn unreachable_proxy_is_io_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = Socks5Connector::new(addr.to_string())
        .with_timeout(Duration::from_secs(5))
        .connect("127.0.0.1:9")
        .await
        .unwrap_err();

    assert!(matches!(err, SocksError::Io(_)), "{err}");
}
