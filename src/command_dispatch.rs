//! Purpose: Hold top-level CLI command dispatch for `graphstore`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Command output envelopes and exit code semantics stay unchanged.

use super::*;

pub(super) fn dispatch_command(command: Command, data_dir: PathBuf) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "graphstore", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Store {
            file,
            max_edges,
            remote,
        } => {
            let payload = read_payload(file.as_deref())?;
            let value = parse_value(&payload)?;
            let graph = decode(&value, edge_limit(max_edges)).map_err(Error::from)?;
            let id = match remote_client(&remote)? {
                Some(client) => client.save_graph(&graph)?,
                None => LocalClient::new()
                    .with_data_dir(&data_dir)
                    .save_graph(&graph)?,
            };
            emit_json(json!({ "id": id }));
            Ok(RunOutcome::ok())
        }
        Command::Get { id, remote } => {
            let graph = match remote_client(&remote)? {
                Some(client) => client.graph(&id)?,
                None => LocalClient::new().with_data_dir(&data_dir).graph(&id)?,
            };
            emit_json(encode(&graph));
            Ok(RunOutcome::ok())
        }
        Command::Check { id, vertex, remote } => {
            let contains = match remote_client(&remote)? {
                Some(client) => client.has_vertex(&id, &vertex)?,
                None => LocalClient::new()
                    .with_data_dir(&data_dir)
                    .has_vertex(&id, &vertex)?,
            };
            emit_json(json!({ "contains": contains }));
            Ok(RunOutcome::ok())
        }
        Command::Validate { file, max_edges } => {
            let payload = read_payload(file.as_deref())?;
            let value = parse_value(&payload)?;
            let graph = decode(&value, edge_limit(max_edges)).map_err(Error::from)?;
            emit_json(json!({
                "ok": true,
                "vertexes": graph.vertex_count(),
                "edges": graph.edge_count(),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Serve(args) => {
            let bind: SocketAddr = args.bind.parse().map_err(|_| {
                Error::new(ErrorKind::Usage)
                    .with_message("invalid bind address")
                    .with_hint("Use a host:port value like 127.0.0.1:9800.")
            })?;
            let config = serve::ServeConfig {
                bind,
                data_dir,
                max_edges: edge_limit(args.max_edges),
                token: args.token,
                allow_non_loopback: args.allow_non_loopback,
                max_body_bytes: args.max_body_bytes,
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))?;
            Ok(RunOutcome::ok())
        }
    }
}
