use std::{sync::Arc, time::Duration};

use clap::Args;
use sitebind_app::{
    domain::registration::{
        audit::TracingAuditSink,
        handshake::{HandshakeAttempt, HandshakeClient, HandshakeReport},
        proof::ProofTokenService,
        rules::RegistrationRules,
        transport::ReqwestTransport,
    },
    signing::{Signer, SigningSecret},
};

#[derive(Debug, Args)]
pub(crate) struct CheckDomainArgs {
    /// Domain to verify, e.g. `shop.example.com`
    #[arg(long)]
    domain: String,

    /// Host the platform is reached on; sent as the handshake source
    #[arg(long)]
    source: String,

    /// Per-attempt timeout
    #[arg(long, default_value_t = 5)]
    timeout_seconds: u64,

    /// Accept hostnames that are not strictly valid
    #[arg(long)]
    skip_hostname_validation: bool,

    /// Shared HMAC signing secret
    #[arg(long, env = "SIGNING_SECRET", hide_env_values = true)]
    signing_secret: String,
}

pub(crate) async fn run(args: CheckDomainArgs) -> Result<(), String> {
    let rules = RegistrationRules::new(!args.skip_hostname_validation);

    let domain = rules.check_domain(&args.domain).map_err(|errors| {
        errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    let secret = SigningSecret::new(args.signing_secret).map_err(|error| error.to_string())?;
    let signer = Signer::new(&secret).map_err(|error| error.to_string())?;

    let transport = ReqwestTransport::new(Duration::from_secs(args.timeout_seconds))
        .map_err(|error| format!("failed to build HTTP client: {error}"))?;

    let client = HandshakeClient::new(
        Arc::new(transport),
        ProofTokenService::new(signer),
        Arc::new(TracingAuditSink),
    );

    match client.verify(&domain, &args.source).await {
        Ok(report) => {
            print_report(&report);

            println!("verified: {domain}");

            Ok(())
        }
        Err(error) => {
            print_report(&error.report);

            Err(format!("{domain}: {error}"))
        }
    }
}

fn print_report(report: &HandshakeReport) {
    println!("domain: {}", report.domain);
    println!("source: {}", report.source);
    println!("challenge: {}", report.challenge);

    for HandshakeAttempt {
        scheme,
        url,
        status,
        outcome,
        message,
    } in &report.attempts
    {
        let status = status.map_or_else(|| "-".to_string(), |status| status.to_string());

        println!("{scheme}\t{status}\t{}\t{url}\t{message}", outcome.as_str());
    }
}
