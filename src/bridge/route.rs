/// The four query routes a bridged path can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Detail,
    List,
    ContentFilter,
    DateFilter,
}

impl Route {
    pub const ALL: [Route; 4] = [
        Route::Detail,
        Route::List,
        Route::ContentFilter,
        Route::DateFilter,
    ];

    /// Substring a path must contain to take this route.
    pub fn pattern(self) -> &'static str {
        match self {
            Route::Detail => "/newsdetail/",
            Route::List => "/newslist/?n=",
            Route::ContentFilter => "/newslist/filtered/?s=",
            Route::DateFilter => "/newslist/filtered/date/?date=",
        }
    }

    /// 1-based destination topic index.
    pub fn destination(self) -> usize {
        match self {
            Route::Detail => 1,
            Route::List => 2,
            Route::ContentFilter => 3,
            Route::DateFilter => 4,
        }
    }

    /// Route whose pattern occurs in `path`.
    ///
    /// When several patterns occur, the longest wins, so the result does not
    /// depend on the order of [`Route::ALL`].
    pub fn classify(path: &str) -> Option<Route> {
        Route::ALL
            .into_iter()
            .filter(|route| path.contains(route.pattern()))
            .max_by_key(|route| route.pattern().len())
    }
}
