//! Enumerate the services accessible to an AWS Organization.
//!
//! IAM can generate an "organizations access report" for an entity in an
//! organization, listing every service the entity is able to access. The
//! report is generated asynchronously, so this utility submits a job for
//! the root of the organization, polls until it completes and then pages
//! through the results, printing them as a single JSON document.
use clap::{App, Arg, ArgMatches, SubCommand};
use regex::Regex;
use rusoto_iam::{
    GenerateOrganizationsAccessReportRequest, GetOrganizationsAccessReportRequest, Iam, IamClient,
};
use rusoto_organizations::{ListRootsRequest, Organizations, OrganizationsClient};
use serde::Serialize;
use tokio::time::delay_for;

use crate::aws;
use crate::cli;
use crate::types::UtilResult;

pub mod poll;

use self::poll::PollPolicy;

/// Generates an appropriate `SubCommand` for this module.
pub fn cmd<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("access-report")
        .about("Enumerate the services accessible to your organization")
        .args(&cli::global_args())
        .args(&[
            Arg::with_name("interval")
                .help("Initial delay between polls of the report job")
                .long("poll-interval")
                .takes_value(true)
                .default_value("1s"),
            Arg::with_name("max_interval")
                .help("Maximum delay between polls of the report job")
                .long("max-poll-interval")
                .takes_value(true)
                .default_value("30s"),
            Arg::with_name("max_attempts")
                .help("Number of polls before giving up on the report job")
                .long("max-attempts")
                .takes_value(true)
                .default_value("120"),
        ])
}

/// Executes this subcommand and returns a `UtilResult` to indicate success.
pub async fn exec(args: &ArgMatches<'_>) -> UtilResult<()> {
    let policy = PollPolicy {
        interval: cli::get_duration(args, "interval")?,
        max_interval: cli::get_duration(args, "max_interval")?,
        max_attempts: args.value_of("max_attempts").unwrap_or("120").parse()?,
    };

    let clients = Clients {
        iam: aws::iam()?,
        organizations: aws::organizations()?,
    };

    let arn = clients.root_arn().await?;
    let entity = entity_path(&arn)?;

    info!("Generating access report for {}...", entity);
    let job_id = clients.generate(&entity).await?;

    let services = gather(&clients, &job_id, &policy).await?;
    info!("Found {} accessible services", services.len());

    println!("{}", serde_json::to_string_pretty(&services)?);

    Ok(())
}

/// A service accessible to the organization.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServiceEntry {
    pub name: String,
    pub namespace: String,
}

/// Status of an access report job.
#[derive(Clone, Debug, PartialEq)]
pub enum JobStatus {
    InProgress,
    Completed,
    Other(String),
}

impl From<String> for JobStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            _ => JobStatus::Other(status),
        }
    }
}

/// A single page of a report, along with the current job status.
#[derive(Clone, Debug)]
pub struct ReportPage {
    pub status: JobStatus,
    pub services: Vec<ServiceEntry>,
    pub is_truncated: bool,
    pub marker: Option<String>,
}

/// Service able to generate access reports for an organization.
pub trait AccessReporter {
    /// Fetches the ARN of the organization root.
    async fn root_arn(&self) -> UtilResult<String>;

    /// Submits a report job for an entity path, returning the job id.
    async fn generate(&self, entity_path: &str) -> UtilResult<String>;

    /// Fetches the status (and results, once available) of a job.
    async fn fetch(&self, job_id: &str, marker: Option<String>) -> UtilResult<ReportPage>;
}

/// Rusoto backed `AccessReporter`.
pub struct Clients {
    iam: IamClient,
    organizations: OrganizationsClient,
}

impl AccessReporter for Clients {
    async fn root_arn(&self) -> UtilResult<String> {
        let response = self
            .organizations
            .list_roots(ListRootsRequest::default())
            .await?;

        response
            .roots
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|root| root.arn)
            .ok_or_else(|| "Organization has no root".into())
    }

    async fn generate(&self, entity_path: &str) -> UtilResult<String> {
        let request = GenerateOrganizationsAccessReportRequest {
            entity_path: entity_path.to_string(),
            ..GenerateOrganizationsAccessReportRequest::default()
        };

        self.iam
            .generate_organizations_access_report(request)
            .await?
            .job_id
            .ok_or_else(|| "Report generation returned no job id".into())
    }

    async fn fetch(&self, job_id: &str, marker: Option<String>) -> UtilResult<ReportPage> {
        let request = GetOrganizationsAccessReportRequest {
            job_id: job_id.to_string(),
            marker,
            ..GetOrganizationsAccessReportRequest::default()
        };

        let response = self.iam.get_organizations_access_report(request).await?;

        let services = response
            .access_details
            .unwrap_or_default()
            .into_iter()
            .map(|detail| ServiceEntry {
                name: detail.service_name,
                namespace: detail.service_namespace,
            })
            .collect();

        Ok(ReportPage {
            status: JobStatus::from(response.job_status),
            services,
            is_truncated: response.is_truncated.unwrap_or(false),
            marker: response.marker,
        })
    }
}

/// Derives the entity path of an organization root from its ARN.
///
/// Root ARNs look like `arn:aws:organizations::111111111111:root/o-abc/r-ab12`,
/// where the entity path is everything after `root/`.
pub fn entity_path(arn: &str) -> UtilResult<String> {
    let pattern = Regex::new(r"^arn:[^:]+:organizations::\d+:root/(.+/.+)$")?;

    pattern
        .captures(arn)
        .and_then(|captures| captures.get(1))
        .map(|path| path.as_str().to_string())
        .ok_or_else(|| format!("Unable to parse organization root ARN: {}", arn).into())
}

/// Polls a single page of a job until the job has completed.
async fn poll<R: AccessReporter>(
    reporter: &R,
    job_id: &str,
    marker: Option<String>,
    policy: &PollPolicy,
) -> UtilResult<ReportPage> {
    let mut attempts = 0;

    loop {
        let page = reporter.fetch(job_id, marker.clone()).await?;

        match page.status {
            JobStatus::Completed => return Ok(page),
            JobStatus::Other(status) => {
                return Err(format!("Unexpected job status: {}", status).into());
            }
            JobStatus::InProgress => {
                attempts += 1;

                if attempts >= policy.max_attempts {
                    return Err(format!(
                        "Report job {} still in progress after {} attempts",
                        job_id, attempts
                    )
                    .into());
                }

                let delay = policy.delay(attempts - 1);
                debug!("Report job {} in progress, waiting {:?}", job_id, delay);
                delay_for(delay).await;
            }
        }
    }
}

/// Collects every service in a report, following truncated pages.
pub async fn gather<R: AccessReporter>(
    reporter: &R,
    job_id: &str,
    policy: &PollPolicy,
) -> UtilResult<Vec<ServiceEntry>> {
    let mut services = Vec::new();
    let mut marker = None;

    loop {
        let page = poll(reporter, job_id, marker.take(), policy).await?;
        services.extend(page.services);

        if !page.is_truncated {
            return Ok(services);
        }

        match page.marker {
            Some(next) => marker = Some(next),
            None => return Err("Truncated report page without a marker".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::poll::PollPolicy;
    use super::{AccessReporter, JobStatus, ReportPage, ServiceEntry};
    use crate::types::UtilResult;

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Reporter replaying a scripted sequence of pages.
    #[derive(Default)]
    struct ScriptedReporter {
        pages: RefCell<VecDeque<ReportPage>>,
        markers: RefCell<Vec<Option<String>>>,
    }

    impl ScriptedReporter {
        fn then(self, page: ReportPage) -> Self {
            self.pages.borrow_mut().push_back(page);
            self
        }

        fn fetches(&self) -> usize {
            self.markers.borrow().len()
        }
    }

    impl AccessReporter for ScriptedReporter {
        async fn root_arn(&self) -> UtilResult<String> {
            Ok("arn:aws:organizations::111111111111:root/o-abc/r-ab12".into())
        }

        async fn generate(&self, _entity_path: &str) -> UtilResult<String> {
            Ok("job-1".into())
        }

        async fn fetch(&self, _job_id: &str, marker: Option<String>) -> UtilResult<ReportPage> {
            self.markers.borrow_mut().push(marker);
            self.pages
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| "no more pages".into())
        }
    }

    fn status(status: &str) -> ReportPage {
        ReportPage {
            status: JobStatus::from(status.to_string()),
            services: Vec::new(),
            is_truncated: false,
            marker: None,
        }
    }

    fn completed(services: &[(&str, &str)], marker: Option<&str>) -> ReportPage {
        ReportPage {
            status: JobStatus::Completed,
            services: services
                .iter()
                .map(|(name, namespace)| ServiceEntry {
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                })
                .collect(),
            is_truncated: marker.is_some(),
            marker: marker.map(str::to_string),
        }
    }

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
            max_attempts,
        }
    }

    #[test]
    fn parsing_job_statuses() {
        assert_eq!(JobStatus::from("IN_PROGRESS".to_string()), JobStatus::InProgress);
        assert_eq!(JobStatus::from("COMPLETED".to_string()), JobStatus::Completed);
        assert_eq!(
            JobStatus::from("FAILED".to_string()),
            JobStatus::Other("FAILED".into())
        );
    }

    #[test]
    fn extracting_entity_paths() {
        let arn = "arn:aws:organizations::111111111111:root/o-exampleorgid/r-examplerootid111";

        assert_eq!(
            super::entity_path(arn).unwrap(),
            "o-exampleorgid/r-examplerootid111"
        );
        assert!(super::entity_path("arn:aws:iam::111111111111:role/admin").is_err());
        assert!(super::entity_path("not an arn").is_err());
    }

    #[tokio::test]
    async fn polling_until_the_job_completes() {
        let reporter = ScriptedReporter::default()
            .then(status("IN_PROGRESS"))
            .then(status("IN_PROGRESS"))
            .then(completed(&[("Amazon S3", "s3")], None));

        let services = super::gather(&reporter, "job-1", &policy(10))
            .await
            .unwrap();

        assert_eq!(reporter.fetches(), 3);
        assert_eq!(
            services,
            vec![ServiceEntry {
                name: "Amazon S3".into(),
                namespace: "s3".into()
            }]
        );
    }

    #[tokio::test]
    async fn unexpected_statuses_fail_immediately() {
        let reporter = ScriptedReporter::default()
            .then(status("IN_PROGRESS"))
            .then(status("FAILED"))
            .then(completed(&[("Amazon S3", "s3")], None));

        let err = super::gather(&reporter, "job-1", &policy(10))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unexpected job status: FAILED");
        assert_eq!(reporter.fetches(), 2);
    }

    #[tokio::test]
    async fn following_truncated_pages_in_order() {
        let reporter = ScriptedReporter::default()
            .then(completed(&[("Amazon S3", "s3"), ("AWS IAM", "iam")], Some("m1")))
            .then(completed(&[("Amazon EC2", "ec2")], Some("m2")))
            .then(completed(&[("AWS Lambda", "lambda")], None));

        let services = super::gather(&reporter, "job-1", &policy(10))
            .await
            .unwrap();

        let namespaces: Vec<_> = services.iter().map(|s| s.namespace.as_str()).collect();

        assert_eq!(namespaces, vec!["s3", "iam", "ec2", "lambda"]);
        assert_eq!(
            *reporter.markers.borrow(),
            vec![None, Some("m1".to_string()), Some("m2".to_string())]
        );
    }

    #[tokio::test]
    async fn giving_up_on_stuck_jobs() {
        let reporter = ScriptedReporter::default()
            .then(status("IN_PROGRESS"))
            .then(status("IN_PROGRESS"))
            .then(status("IN_PROGRESS"))
            .then(completed(&[("Amazon S3", "s3")], None));

        let err = super::gather(&reporter, "job-1", &policy(3))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Report job job-1 still in progress after 3 attempts"
        );
        assert_eq!(reporter.fetches(), 3);
    }

    #[tokio::test]
    async fn truncated_pages_require_markers() {
        let mut page = completed(&[("Amazon S3", "s3")], None);
        page.is_truncated = true;

        let reporter = ScriptedReporter::default().then(page);
        let result = super::gather(&reporter, "job-1", &policy(3)).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn submitting_reports_for_the_root() {
        let reporter = ScriptedReporter::default();

        let arn = reporter.root_arn().await.unwrap();
        let entity = super::entity_path(&arn).unwrap();

        assert_eq!(entity, "o-abc/r-ab12");
        assert_eq!(reporter.generate(&entity).await.unwrap(), "job-1");
    }

    #[test]
    fn serializing_services_as_indented_json() {
        let services = vec![
            ServiceEntry {
                name: "Amazon S3".into(),
                namespace: "s3".into(),
            },
            ServiceEntry {
                name: "AWS IAM".into(),
                namespace: "iam".into(),
            },
        ];

        let expected = concat!(
            "[\n",
            "  {\n",
            "    \"name\": \"Amazon S3\",\n",
            "    \"namespace\": \"s3\"\n",
            "  },\n",
            "  {\n",
            "    \"name\": \"AWS IAM\",\n",
            "    \"namespace\": \"iam\"\n",
            "  }\n",
            "]"
        );

        assert_eq!(serde_json::to_string_pretty(&services).unwrap(), expected);
    }
}
