use crate::args::{Cli, Command};
use crate::config::PagerConfig;
use log::{debug, warn};
use pager_engine::{JsonLinesEmitter, PageEmitter, PagerError, Session, Summary};
use std::io::Write;

/// Builds the session from configuration and runs the parsed command,
/// writing results to stdout and the continuation token, if any, to stderr.
pub async fn run(cli: Cli, config: &PagerConfig) -> Result<(), PagerError> {
    let settings = config.client_settings(cli.endpoint.as_deref())?;
    let session = Session::from_settings(&settings)?;

    let stdout = std::io::stdout();
    let mut emitter = JsonLinesEmitter::new(stdout.lock(), cli.select.clone());
    let summary = execute(&session, &cli.command, &mut emitter).await?;

    if let Some(summary) = summary {
        report_next_token(&mut std::io::stderr(), &summary)?;
    }
    Ok(())
}

/// Runs one command against `session`. Describe commands return their summary.
pub async fn execute<E: PageEmitter + ?Sized>(
    session: &Session,
    command: &Command,
    emitter: &mut E,
) -> Result<Option<Summary>, PagerError> {
    match command {
        Command::Invoke(args) => {
            let request = args.to_request()?;
            session.invoke(&request, emitter).await?;
            Ok(None)
        }
        Command::Describe(args) => {
            let request = args.to_request()?;
            let mut paginator = session.paginate(&request);
            match paginator.drive(emitter).await {
                Ok(summary) => {
                    debug!(
                        "{} returned {} item(s) in {} page(s)",
                        request.operation(),
                        summary.items,
                        summary.pages
                    );
                    Ok(Some(summary))
                }
                Err(e) => {
                    if let Some(cursor) = paginator.resume_cursor() {
                        warn!(
                            "{} stopped; results so far were written, resume with --next-token {}",
                            request.operation(),
                            cursor
                        );
                    }
                    Err(e)
                }
            }
        }
    }
}

/// Prints the cursor left over by a describe so the caller can continue.
pub fn report_next_token<W: Write>(out: &mut W, summary: &Summary) -> Result<(), PagerError> {
    if let Some(cursor) = &summary.next_cursor {
        writeln!(out, "NextToken: {}", cursor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pager_engine::{CollectingEmitter, Cursor, Page, PaginationMode, ScriptedApi};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn command(args: &[&str]) -> Command {
        Cli::try_parse_from(args).expect("arguments").command
    }

    #[tokio::test]
    async fn test_describe_runs_paginator() {
        let api = Arc::new(ScriptedApi::with_page_chain(&[2, 2, 1]));
        let session = Session::new(api.clone());
        let mut emitter = CollectingEmitter::new();

        let summary = execute(
            &session,
            &command(&["pager", "describe", "DescribeVolumes", "--max-items", "3"]),
            &mut emitter,
        )
        .await
        .unwrap()
        .expect("describe returns a summary");

        assert_eq!(summary.items, 4);
        assert_eq!(api.call_count(), 2);
        assert_eq!(emitter.item_count(), 4);
    }

    #[tokio::test]
    async fn test_invoke_runs_once() {
        let api = Arc::new(ScriptedApi::new());
        api.push_value(json!({"Return": true}));
        let session = Session::new(api.clone());
        let mut emitter = CollectingEmitter::new();

        let summary = execute(
            &session,
            &command(&["pager", "invoke", "DisassociateAddress", "-f", "AssociationId=eipassoc-1"]),
            &mut emitter,
        )
        .await
        .unwrap();

        assert!(summary.is_none());
        assert_eq!(emitter.values, vec![json!({"Return": true})]);
        assert_eq!(api.calls()[0].fields["AssociationId"], "eipassoc-1");
    }

    #[tokio::test]
    async fn test_describe_error_keeps_emitted_pages() {
        let api = Arc::new(ScriptedApi::new());
        api.push_page(Page::new(vec![json!("vol-1")], Cursor::new("tok-1")));
        api.push_page_error("Throttling");
        let session = Session::new(api.clone());
        let mut emitter = CollectingEmitter::new();

        let result = execute(
            &session,
            &command(&["pager", "describe", "DescribeVolumes"]),
            &mut emitter,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(emitter.item_count(), 1);
    }

    #[test]
    fn test_report_next_token() {
        let mut out = Vec::new();
        let summary = Summary {
            mode: PaginationMode::Manual,
            pages: 1,
            items: 5,
            next_cursor: Cursor::new("tok-42"),
        };
        report_next_token(&mut out, &summary).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "NextToken: tok-42\n");

        let mut out = Vec::new();
        let done = Summary {
            next_cursor: None,
            ..summary
        };
        report_next_token(&mut out, &done).unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_run_against_http_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/DescribeRegions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Regions": [{"RegionName": "eu-west-1"}, {"RegionName": "us-east-1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cli = Cli::try_parse_from([
            "pager",
            "--endpoint",
            server.uri().as_str(),
            "describe",
            "DescribeRegions",
        ])
        .unwrap();

        run(cli, &PagerConfig::default()).await.unwrap();
        server.verify().await;
    }
}
