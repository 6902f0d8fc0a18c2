//! Interactive shell for the keeper client: a line-oriented REPL that reads a
//! command, tokenizes it, and dispatches to a small command table. Every
//! command other than `register`/`login`/`help`/`quit` operates on the local
//! vault only — the [`SyncEngine`] reconciles with the server in the
//! background, not inline with a command.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use keeper_domain::config::ClientConfig;
use keeper_domain::items::{Binary, Card, LoginCred, Note};
use keeper_identity::{AuthClient, derive_session_vault};
use keeper_kernel::config::load_config;
use keeper_localstore::LocalVault;
use keeper_logger::Logger;
use keeper_remote::RemoteVault;
use keeper_secrets::{SecretsClient, SyncEngine};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A logged-in session: the local-first CRUD facade plus the background
/// sync task reconciling it against the server.
struct Session {
    secrets: SecretsClient,
    sync_token: CancellationToken,
    sync_handle: tokio::task::JoinHandle<()>,
}

struct Shell {
    config: ClientConfig,
    local: LocalVault,
    remote: RemoteVault,
    auth: AuthClient,
    session: Mutex<Option<Session>>,
}

impl Shell {
    fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let local = LocalVault::new(config.storage.root.clone());
        let remote = RemoteVault::new(&config.remote)?;
        let auth =
            AuthClient::new(remote.clone(), local.clone(), config.storage.credentials_file.clone());
        Ok(Self { config, local, remote, auth, session: Mutex::new(None) })
    }

    async fn start_session(&self, login: &str, password: &str) -> anyhow::Result<()> {
        let vault = derive_session_vault(login, password)?;
        let secrets = SecretsClient::new(self.local.clone(), self.remote.clone(), vault);
        let sync_token = CancellationToken::new();
        let engine = SyncEngine::new(
            secrets.clone(),
            Duration::from_secs(self.config.sync.check_interval_seconds),
        );
        let run_token = sync_token.clone();
        let sync_handle = tokio::spawn(async move { engine.run(run_token).await });

        let mut guard = self.session.lock().await;
        if let Some(previous) = guard.take() {
            previous.sync_token.cancel();
            let _ = previous.sync_handle.await;
        }
        *guard = Some(Session { secrets, sync_token, sync_handle });
        Ok(())
    }

    async fn secrets(&self) -> anyhow::Result<SecretsClient> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.secrets.clone())
            .ok_or_else(|| anyhow::anyhow!("not logged in; use `login` or `register` first"))
    }

    /// Stops the background sync task (if any) and runs one last
    /// reconciliation before the process exits.
    async fn shutdown(&self) {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.take() {
            session.sync_token.cancel();
            let _ = session.sync_handle.await;
            let final_pass = SyncEngine::new(session.secrets, Duration::from_secs(1));
            final_pass.check_all().await;
        }
    }
}

#[keeper_runtime::main(memory_efficient)]
async fn main() -> anyhow::Result<()> {
    let _logger = Logger::builder().name(env!("CARGO_PKG_NAME")).console(true).init()?;

    let config: ClientConfig =
        load_config(Some("client")).unwrap_or_else(|_| ClientConfig::default());

    let shell = Arc::new(Shell::new(config)?);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    println!("keeper shell. Type `help` for commands, `quit` to exit.");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                eprintln!("error reading input: {error}");
                break;
            }
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = tokens.first() else { continue };

        if command == "quit" {
            break;
        }

        if let Err(error) = dispatch(&shell, command, &tokens[1..]).await {
            eprintln!("error: {error}");
        }
    }

    shell.shutdown().await;
    Ok(())
}

async fn dispatch(shell: &Shell, command: &str, args: &[&str]) -> anyhow::Result<()> {
    match command {
        "help" => {
            print_help();
            Ok(())
        }
        "register" => {
            let [login, password] = args else {
                anyhow::bail!("usage: register <login> <password>");
            };
            shell.auth.register(login, password).await?;
            shell.start_session(login, password).await?;
            println!("registered and logged in as {login}");
            Ok(())
        }
        "login" => {
            let [login, password] = args else {
                anyhow::bail!("usage: login <login> <password>");
            };
            let outcome = shell.auth.login(login, password).await?;
            shell.start_session(login, password).await?;
            if outcome.logged_offline {
                println!("logged in as {login} (offline)");
            } else {
                println!("logged in as {login}");
            }
            Ok(())
        }
        "setcard" => {
            let [name, number, holder_name, holder_surname, valid_till, cvv] = args else {
                anyhow::bail!(
                    "usage: setcard <name> <number> <holder_name> <holder_surname> <valid_till> <cvv>"
                );
            };
            let secrets = shell.secrets().await?;
            secrets.add_card(&Card {
                name: (*name).to_owned(),
                number: (*number).to_owned(),
                cardholder_name: (*holder_name).to_owned(),
                cardholder_surname: (*holder_surname).to_owned(),
                valid_till: (*valid_till).to_owned(),
                cvv: (*cvv).to_owned(),
            })?;
            println!("saved card '{name}'");
            Ok(())
        }
        "getcard" => {
            let [name] = args else {
                anyhow::bail!("usage: getcard <name>");
            };
            let card = shell.secrets().await?.get_card(name)?;
            println!(
                "{}: {} {} {} exp {} cvv {}",
                card.name, card.number, card.cardholder_name, card.cardholder_surname, card.valid_till, card.cvv
            );
            Ok(())
        }
        "listcards" => {
            print_names(shell.secrets().await?.list_cards());
            Ok(())
        }
        "setlogincred" => {
            let [name, site, login, password] = args else {
                anyhow::bail!("usage: setlogincred <name> <site> <login> <password>");
            };
            shell.secrets().await?.add_login_cred(&LoginCred {
                name: (*name).to_owned(),
                site: (*site).to_owned(),
                login: (*login).to_owned(),
                password: (*password).to_owned(),
            })?;
            println!("saved login credential '{name}'");
            Ok(())
        }
        "getlogincred" => {
            let [name] = args else {
                anyhow::bail!("usage: getlogincred <name>");
            };
            let cred = shell.secrets().await?.get_login_cred(name)?;
            println!("{}: {} {} {}", cred.name, cred.site, cred.login, cred.password);
            Ok(())
        }
        "listlogincreds" => {
            print_names(shell.secrets().await?.list_login_creds());
            Ok(())
        }
        "setnote" => {
            if args.len() < 2 {
                anyhow::bail!("usage: setnote <name> <text...>");
            }
            let name = args[0];
            let text = args[1..].join(" ");
            shell.secrets().await?.add_note(&Note { name: name.to_owned(), text })?;
            println!("saved note '{name}'");
            Ok(())
        }
        "getnote" => {
            let [name] = args else {
                anyhow::bail!("usage: getnote <name>");
            };
            let note = shell.secrets().await?.get_note(name)?;
            println!("{}: {}", note.name, note.text);
            Ok(())
        }
        "listnotes" => {
            print_names(shell.secrets().await?.list_notes());
            Ok(())
        }
        "setbinary" => {
            let [name, filename] = args else {
                anyhow::bail!("usage: setbinary <name> <filename-in-binaries_in>");
            };
            let path = shell.config.storage.binaries_in.join(filename);
            let data = std::fs::read(&path)
                .map_err(|e| anyhow::anyhow!("reading '{}': {e}", path.display()))?;
            shell.secrets().await?.add_binary(&Binary { name: (*name).to_owned(), data })?;
            println!("saved binary '{name}' from {}", path.display());
            Ok(())
        }
        "getbinary" => {
            let (name, out_name) = match args {
                [name] => (*name, *name),
                [name, out_name] => (*name, *out_name),
                _ => anyhow::bail!("usage: getbinary <name> [output filename]"),
            };
            let binary = shell.secrets().await?.get_binary(name)?;
            std::fs::create_dir_all(&shell.config.storage.binaries_out)?;
            let path = shell.config.storage.binaries_out.join(out_name);
            std::fs::write(&path, &binary.data)
                .map_err(|e| anyhow::anyhow!("writing '{}': {e}", path.display()))?;
            println!("wrote binary '{name}' to {}", path.display());
            Ok(())
        }
        "listbinaries" => {
            print_names(shell.secrets().await?.list_binaries());
            Ok(())
        }
        other => anyhow::bail!("unknown command '{other}'; try `help`"),
    }
}

fn print_names(names: Vec<String>) {
    if names.is_empty() {
        println!("(none)");
        return;
    }
    for name in names {
        println!("{name}");
    }
}

fn print_help() {
    println!(
        "commands:\n\
         \x20 register <login> <password>\n\
         \x20 login <login> <password>\n\
         \x20 setcard <name> <number> <holder_name> <holder_surname> <valid_till> <cvv>\n\
         \x20 getcard <name> | listcards\n\
         \x20 setlogincred <name> <site> <login> <password>\n\
         \x20 getlogincred <name> | listlogincreds\n\
         \x20 setnote <name> <text...>\n\
         \x20 getnote <name> | listnotes\n\
         \x20 setbinary <name> <filename-in-binaries_in>\n\
         \x20 getbinary <name> [output filename] | listbinaries\n\
         \x20 help | quit"
    );
}
