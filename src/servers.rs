use crate::endpoint::ServerEndpoint;
use once_cell::sync::Lazy;
use std::{collections::HashMap, sync::Arc};

/// Suffix → server table consulted by the resolver, plus the entry used for
/// IP address queries.
#[derive(Debug, Clone, Default)]
pub struct ServerTable {
    entries: HashMap<String, ServerEndpoint>,
    ip: Option<ServerEndpoint>,
}

impl ServerTable {
    /// Empty table, mostly useful for tests and custom deployments.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table shipped with the crate.
    pub fn builtin() -> Arc<ServerTable> {
        BUILTIN_SERVERS.clone()
    }

    pub fn insert(&mut self, suffix: impl Into<String>, server: ServerEndpoint) -> &mut Self {
        self.entries.insert(suffix.into(), server);
        self
    }

    pub fn with_ip_server(mut self, server: ServerEndpoint) -> Self {
        self.ip = Some(server);
        self
    }

    pub fn get(&self, suffix: &str) -> Option<&ServerEndpoint> {
        self.entries.get(suffix)
    }

    pub fn ip_server(&self) -> Option<&ServerEndpoint> {
        self.ip.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn host(name: &str) -> ServerEndpoint {
    ServerEndpoint::new(name)
}

static BUILTIN_SERVERS: Lazy<Arc<ServerTable>> = Lazy::new(|| {
    let mut t = ServerTable::new().with_ip_server(host("whois.arin.net").with_query("n + $addr\r\n"));

    // Generic TLDs
    t.insert("com", host("whois.verisign-grs.com"));
    t.insert("net", host("whois.verisign-grs.com"));
    t.insert("org", host("whois.pir.org"));
    t.insert("info", host("whois.afilias.net"));
    t.insert("biz", host("whois.nic.biz"));
    t.insert("name", host("whois.nic.name"));
    t.insert("pro", host("whois.nic.pro"));
    t.insert("mobi", host("whois.nic.mobi"));
    t.insert("aero", host("whois.aero"));
    t.insert("asia", host("whois.nic.asia"));
    t.insert("coop", host("whois.nic.coop"));
    t.insert("edu", host("whois.educause.edu"));
    t.insert("gov", host("whois.dotgov.gov"));
    t.insert("int", host("whois.iana.org"));
    t.insert("jobs", host("whois.nic.jobs"));
    t.insert("museum", host("whois.nic.museum"));
    t.insert("tel", host("whois.nic.tel"));
    t.insert("travel", host("whois.nic.travel"));

    // Popular new gTLDs
    t.insert("xyz", host("whois.nic.xyz"));
    t.insert("top", host("whois.nic.top"));
    t.insert("shop", host("whois.nic.shop"));
    t.insert("online", host("whois.nic.online"));
    t.insert("store", host("whois.nic.store"));
    t.insert("site", host("whois.nic.site"));
    t.insert("app", host("whois.nic.google"));
    t.insert("dev", host("whois.nic.google"));
    t.insert("page", host("whois.nic.google"));
    t.insert("tech", host("whois.nic.tech"));
    t.insert("blog", host("whois.nic.blog"));
    t.insert("club", host("whois.nic.club"));
    t.insert("live", host("whois.nic.live"));
    t.insert("global", host("whois.nic.global"));
    t.insert("io", host("whois.nic.io"));
    t.insert("ac", host("whois.nic.ac"));
    t.insert("sh", host("whois.nic.sh"));
    t.insert("tm", host("whois.nic.tm"));
    t.insert("me", host("whois.nic.me"));
    t.insert("co", host("whois.nic.co"));
    t.insert("tv", host("whois.nic.tv"));
    t.insert("cc", host("ccwhois.verisign-grs.com"));

    // Europe
    t.insert("uk", host("whois.nic.uk"));
    t.insert("co.uk", host("whois.nic.uk"));
    t.insert("de", host("whois.denic.de").with_query("-T dn $addr\r\n").without_punycode());
    t.insert("fr", host("whois.nic.fr"));
    t.insert("it", host("whois.nic.it"));
    t.insert("es", host("whois.nic.es"));
    t.insert("nl", host("whois.domain-registry.nl"));
    t.insert("be", host("whois.dns.be"));
    t.insert("ch", host("whois.nic.ch"));
    t.insert("at", host("whois.nic.at"));
    t.insert("se", host("whois.iis.se"));
    t.insert("no", host("whois.norid.no"));
    t.insert("dk", host("whois.punktum.dk").with_query("--charset=utf-8 --show-handles $addr\r\n"));
    t.insert("fi", host("whois.fi"));
    t.insert("pl", host("whois.dns.pl"));
    t.insert("cz", host("whois.nic.cz"));
    t.insert("eu", host("whois.eu"));
    t.insert("ru", host("whois.tcinet.ru"));
    t.insert("su", host("whois.tcinet.ru"));
    t.insert("ua", host("whois.ua"));

    // Asia-Pacific
    t.insert("jp", host("whois.jprs.jp").with_query("$addr/e\r\n"));
    t.insert("co.jp", host("whois.jprs.jp").with_query("$addr/e\r\n"));
    t.insert("kr", host("whois.kr"));
    t.insert("cn", host("whois.cnnic.cn"));
    t.insert("hk", host("whois.hkirc.hk"));
    t.insert("tw", host("whois.twnic.net.tw"));
    t.insert("sg", host("whois.sgnic.sg"));
    t.insert("in", host("whois.registry.in"));
    t.insert("au", host("whois.auda.org.au"));
    t.insert("nz", host("whois.irs.net.nz"));

    // Americas
    t.insert("ca", host("whois.cira.ca"));
    t.insert("us", host("whois.nic.us"));
    t.insert("mx", host("whois.mx"));
    t.insert("br", host("whois.registro.br"));
    t.insert("ar", host("whois.nic.ar"));
    t.insert("cl", host("whois.nic.cl"));

    // Middle East and Africa
    t.insert("il", host("whois.isoc.org.il"));
    t.insert("tr", host("whois.trabis.gov.tr"));
    t.insert("ae", host("whois.aeda.net.ae"));
    t.insert("za", host("whois.registry.net.za"));
    t.insert("co.za", host("coza-whois.registry.net.za"));

    Arc::new(t)
});
