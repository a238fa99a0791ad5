//! Site profiles: one data-only description per watched web source.

use std::time::Duration;

use url::Url;

use notice_pipeline::{
    ClientOptions, Filters, ListingSpec, ManifestSpec, Recipe, SourceError, SourceResult,
    TitleSource, WebSource,
};

/// What relative listing hrefs resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkBase {
    SiteRoot,
    ListingUrl,
}

/// A watched web source.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Stable name, used on the command line and in logs
    pub name: &'static str,
    pub site_root: &'static str,
    pub listing_url: &'static str,
    pub link_base: LinkBase,
    pub listing: ListingSpec,

    /// Required content container on the detail page
    pub content: &'static str,

    /// Optional containers appended after the content
    pub extra_sections: &'static [&'static str],

    /// Literal fixes for known-bad root-relative paths
    pub link_fixups: &'static [(&'static str, &'static str)],

    /// `(container id, script variable)` of an attachment manifest
    pub manifest: Option<(&'static str, &'static str)>,

    pub title: TitleSource,
    pub keywords: &'static [&'static str],
    pub recency_window_days: Option<i64>,

    /// Skip certificate verification for this site only
    pub accept_invalid_certs: bool,
}

impl SiteProfile {
    fn new(
        name: &'static str,
        site_root: &'static str,
        listing_url: &'static str,
        listing: ListingSpec,
        content: &'static str,
    ) -> Self {
        Self {
            name,
            site_root,
            listing_url,
            link_base: LinkBase::SiteRoot,
            listing,
            content,
            extra_sections: &[],
            link_fixups: &[],
            manifest: None,
            title: TitleSource::Candidate,
            keywords: &[],
            recency_window_days: None,
            accept_invalid_certs: false,
        }
    }

    /// Default filters for this site.
    pub fn filters(&self) -> Filters {
        let filters = Filters::new().with_keywords(self.keywords.iter().copied());
        match self.recency_window_days {
            Some(days) => filters.with_recency_window(days),
            None => filters,
        }
    }

    /// Transform recipe for detail pages.
    pub fn recipe(&self) -> SourceResult<Recipe> {
        let root = parse_url(self.site_root)?;
        let mut recipe = Recipe::new(root, self.content).with_title(self.title);
        for section in self.extra_sections {
            recipe = recipe.with_optional_section(*section);
        }
        for (from, to) in self.link_fixups {
            recipe = recipe.with_link_fixup(*from, *to);
        }
        if let Some((container_id, variable)) = self.manifest {
            recipe = recipe.with_manifest(ManifestSpec::new(container_id, variable));
        }
        Ok(recipe)
    }

    /// Build the web source for this profile.
    pub fn build(&self, request_timeout: Duration) -> SourceResult<WebSource> {
        let client = ClientOptions::default()
            .with_timeout(request_timeout)
            .with_accept_invalid_certs(self.accept_invalid_certs);
        let source = WebSource::new(
            self.name,
            self.listing_url,
            &self.listing,
            self.recipe()?,
            &client,
        )?;

        Ok(match self.link_base {
            LinkBase::SiteRoot => source.with_link_base(parse_url(self.site_root)?),
            LinkBase::ListingUrl => source,
        })
    }
}

fn parse_url(value: &str) -> SourceResult<Url> {
    Url::parse(value).map_err(|e| SourceError::Parse(format!("invalid URL {}: {}", value, e)))
}

/// Every known site, in run order.
pub fn all() -> Vec<SiteProfile> {
    vec![
        SiteProfile {
            keywords: &["kỳ thi", "tuyển dụng", "thí sinh"],
            ..SiteProfile::new(
                "vca_news",
                "https://vca.org.vn/",
                "https://vca.org.vn/tin-vca-c28.html",
                ListingSpec::anchors(".title-5 a"),
                ".content-items",
            )
        },
        SiteProfile {
            link_fixups: &[("/upload/upload/", "/upload/")],
            title: TitleSource::FirstRewrittenLink,
            ..SiteProfile::new(
                "vca_docs",
                "https://vca.org.vn/",
                "https://vca.org.vn/frontend/home/search?s=Th%C3%B4ng+b%C3%A1o+tuy%E1%BB%83n+d%E1%BB%A5ng&loaivanban=&issuing_agency=&year=&submit=T%C3%ACm+ki%E1%BA%BFm",
                ListingSpec::anchors("table.table-bordered tbody tr td a"),
                "table.table.table-bordered",
            )
        },
        SiteProfile {
            keywords: &["tuyển", "viên chức", "thí sinh", "ứng viên", "kỳ thi"],
            accept_invalid_certs: true,
            ..SiteProfile::new(
                "bvhh",
                "https://vienhuyethoc.vn/",
                "https://vienhuyethoc.vn/chuyen-muc/tin-tuc/thong-bao/",
                ListingSpec::anchors(".title a"),
                ".content-text",
            )
        },
        SiteProfile {
            link_base: LinkBase::ListingUrl,
            extra_sections: &[".news-other"],
            recency_window_days: Some(50),
            accept_invalid_certs: true,
            ..SiteProfile::new(
                "hvtp",
                "https://hocvientuphap.edu.vn/",
                "https://hocvientuphap.edu.vn/qt/thongtintuyendung/Pages/thong-tin-tuyen-dung.aspx",
                ListingSpec::rows(".portlet-body .top-news", ".title-news2")
                    .with_date(".col-md-12 .ico-date"),
                ".content-News",
            )
        },
        SiteProfile {
            manifest: Some(("file-placeholder", "_files")),
            recency_window_days: Some(90),
            accept_invalid_certs: true,
            ..SiteProfile::new(
                "bvhttdl",
                "https://bvhttdl.gov.vn/",
                "https://bvhttdl.gov.vn/van-ban-quan-ly.htm?keyword=tuy%E1%BB%83n+d%E1%BB%A5ng&nhom=2&coquan=0&theloai=28&linhvuc=0",
                ListingSpec::rows(".table-data > tbody > tr", "td:nth-child(2) a")
                    .with_title("td:nth-child(2)")
                    .with_date("td:nth-child(4)"),
                ".table-detail",
            )
        },
        SiteProfile::new(
            "department",
            "https://soxaydung.hanoi.gov.vn/",
            "https://soxaydung.hanoi.gov.vn/vi-vn/tim/ket-qua/bmjDoCDhu58geMOjIGjhu5lp",
            ListingSpec::anchors(".col-md-10 h4 a"),
            ".blog-page",
        ),
    ]
}

/// Look a profile up by name.
pub fn find(name: &str) -> Option<SiteProfile> {
    all().into_iter().find(|p| p.name == name)
}

/// Names of all known profiles.
pub fn names() -> Vec<&'static str> {
    all().iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_profile_builds() {
        for profile in all() {
            profile
                .build(Duration::from_secs(5))
                .unwrap_or_else(|e| panic!("{} failed to build: {}", profile.name, e));
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names = names();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 6);
    }

    #[test]
    fn test_profile_filters() {
        let hvtp = find("hvtp").unwrap();
        assert_eq!(hvtp.filters().recency_window_days, Some(50));
        assert!(hvtp.filters().keywords.is_empty());

        let bvhh = find("bvhh").unwrap();
        assert!(bvhh.accept_invalid_certs);
        assert!(bvhh.filters().keywords.contains(&"viên chức".to_string()));
    }

    #[test]
    fn test_unknown_profile() {
        assert!(find("nope").is_none());
    }
}
