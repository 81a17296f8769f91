//! Public tracker table embedded in every generated torrent.

/// Free public trackers, announced as a single equal-priority tier.
pub const PUBLIC_TRACKERS: &[&str] = &[
    "udp://9.rarbg.to:2710/announce",
    "udp://explodie.org:6969",
    "udp://exodus.desync.com:6969/announce",
    "udp://tracker.coppersurfer.tk:6969",
    "udp://tracker.cyberia.is:6969/announce",
    "udp://tracker.empire-js.us:1337",
    "udp://tracker.internetwarriors.net:1337/announce",
    "udp://tracker.leechers-paradise.org:6969",
    "udp://tracker.openbittorrent.com:80/announce",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://tracker.pirateparty.gr:6969/announce",
    "udp://tracker.tiny-vps.com:6969/announce",
];

/// Returns the tracker table as one announce tier.
pub fn announce_tiers() -> Vec<Vec<String>> {
    vec![PUBLIC_TRACKERS.iter().map(|url| url.to_string()).collect()]
}
