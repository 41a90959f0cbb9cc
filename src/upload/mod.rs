//! Upload a staged directory tree into Amazon S3.
//!
//! Every file beneath the staging directory is written to the bucket under
//! the provided prefix, with a content type guessed from the extension and
//! a long lived cache directive. Uploads happen one at a time; the first
//! failure stops the run, leaving any previous uploads in place.
use clap::{App, Arg, ArgMatches, SubCommand};
use pretty_bytes::converter::convert;
use rusoto_s3::{PutObjectRequest, S3Client, S3};

use std::path::Path;

use crate::aws;
use crate::cli;
use crate::types::UtilResult;

pub mod files;

use self::files::{FileEntry, FileWalker};

/// Cache directive attached to every uploaded object (one year).
pub const CACHE_CONTROL: &str = "max-age=31536000";

/// Directory staged files are read from by default.
const STAGING_DIR: &str = "/staging";

/// Generates an appropriate `SubCommand` for this module.
pub fn cmd<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("upload")
        .about("Upload a staged directory tree into Amazon S3")
        .args(&cli::global_args())
        .args(&[
            Arg::with_name("dry")
                .help("Only print out the calculated writes")
                .short("d")
                .long("dry-run"),
            Arg::with_name("bucket")
                .help("The S3 bucket to upload into")
                .short("b")
                .long("bucket")
                .env("BUCKET")
                .takes_value(true)
                .required(true),
            Arg::with_name("prefix")
                .help("A key prefix to upload beneath")
                .short("p")
                .long("prefix")
                .env("PREFIX")
                .takes_value(true)
                .default_value(""),
            Arg::with_name("source")
                .help("The local directory to upload from")
                .index(1)
                .default_value(STAGING_DIR),
        ])
}

/// Executes this subcommand and returns a `UtilResult` to indicate success.
pub async fn exec(args: &ArgMatches<'_>) -> UtilResult<()> {
    let dryrun = cli::is_dry_run(args);

    // all of these are required or defaulted
    let bucket = args.value_of("bucket").unwrap_or_default();
    let prefix = args.value_of("prefix").unwrap_or_default();
    let source = args.value_of("source").unwrap_or(STAGING_DIR);

    let target = Target { bucket, prefix };
    let mut walker = FileWalker::new(source);

    if dryrun {
        while let Some(entry) = walker.next()? {
            info!("Uploading {} to {}", entry.path.display(), target.url(&entry));
        }
        return Ok(());
    }

    upload_all(&aws::s3()?, &mut walker, &target).await
}

/// Destination of an upload run.
pub struct Target<'a> {
    pub bucket: &'a str,
    pub prefix: &'a str,
}

impl Target<'_> {
    /// Computes the object key for a file relative to the staging root.
    pub fn key(&self, entry: &FileEntry) -> String {
        let relative = entry
            .relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            relative
        } else {
            format!("{}/{}", prefix, relative)
        }
    }

    /// Formats the S3 URL a file would be written to.
    pub fn url(&self, entry: &FileEntry) -> String {
        format!("s3://{}/{}", self.bucket, self.key(entry))
    }
}

/// Guesses a content type from the extension of a path.
///
/// Unknown extensions yield `None`, in which case no content type is sent.
pub fn content_type<P: AsRef<Path>>(path: P) -> Option<&'static str> {
    mime_guess::from_path(path).first_raw()
}

/// A single object to write into a bucket.
#[derive(Clone, Debug)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
    pub content_type: Option<String>,
    pub cache_control: String,
    pub body: Vec<u8>,
}

/// Destination which objects can be written into.
pub trait ObjectSink {
    /// Writes a single object.
    async fn put(&self, upload: Upload) -> UtilResult<()>;
}

impl ObjectSink for S3Client {
    async fn put(&self, upload: Upload) -> UtilResult<()> {
        let request = PutObjectRequest {
            bucket: upload.bucket,
            key: upload.key,
            content_length: Some(upload.body.len() as i64),
            body: Some(upload.body.into()),
            cache_control: Some(upload.cache_control),
            content_type: upload.content_type,
            ..PutObjectRequest::default()
        };

        self.put_object(request).await?;
        Ok(())
    }
}

/// Uploads every file from the walker into the target, in order.
pub async fn upload_all<S: ObjectSink>(
    sink: &S,
    walker: &mut FileWalker,
    target: &Target<'_>,
) -> UtilResult<()> {
    while let Some(entry) = walker.next()? {
        let body = tokio::fs::read(&entry.path).await?;

        info!(
            "Uploading {} to {} ({})",
            entry.path.display(),
            target.url(&entry),
            convert(body.len() as f64).replacen(' ', "", 1)
        );

        let upload = Upload {
            bucket: target.bucket.to_string(),
            key: target.key(&entry),
            content_type: content_type(&entry.path).map(str::to_string),
            cache_control: CACHE_CONTROL.to_string(),
            body,
        };

        sink.put(upload).await?;
    }

    Ok(())
}
