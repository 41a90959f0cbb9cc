//! Construction of the AWS service clients used by each tool.
//!
//! Credentials must be provided via guidelines in the [AWS Documentation]
//! (https://docs.aws.amazon.com/cli/latest/userguide/cli-environment.html).
use rusoto_core::{credential::ChainProvider, region::Region, HttpClient};
use rusoto_iam::IamClient;
use rusoto_organizations::OrganizationsClient;
use rusoto_s3::S3Client;
use rusoto_ssm::SsmClient;

use std::time::Duration;

use crate::types::UtilResult;

/// Creates a credential chain which gives up quickly on instance metadata.
fn credentials() -> ChainProvider {
    let mut chain = ChainProvider::new();
    chain.set_timeout(Duration::from_millis(500));
    chain
}

/// IAM and Organizations are global services, served from `us-east-1`.
fn global_region() -> Region {
    Region::UsEast1
}

/// Creates a new S3 client in the default region.
pub fn s3() -> UtilResult<S3Client> {
    Ok(S3Client::new_with(
        HttpClient::new()?,
        credentials(),
        Region::default(),
    ))
}

/// Creates a new SSM client in the default region.
pub fn ssm() -> UtilResult<SsmClient> {
    Ok(SsmClient::new_with(
        HttpClient::new()?,
        credentials(),
        Region::default(),
    ))
}

/// Creates a new IAM client against the global endpoint.
pub fn iam() -> UtilResult<IamClient> {
    Ok(IamClient::new_with(
        HttpClient::new()?,
        credentials(),
        global_region(),
    ))
}

/// Creates a new Organizations client against the global endpoint.
pub fn organizations() -> UtilResult<OrganizationsClient> {
    Ok(OrganizationsClient::new_with(
        HttpClient::new()?,
        credentials(),
        global_region(),
    ))
}
